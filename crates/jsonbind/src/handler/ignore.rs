use alloc::string::String;

use super::{Handler, Signal, unexpected};
use crate::{event::Event, options::ImportOptions};

/// Swallows one value of any shape, used for comment keys.
pub(crate) struct IgnoreHandler {
    nesting: usize,
}

impl IgnoreHandler {
    pub(crate) fn new() -> Self {
        Self { nesting: 0 }
    }
}

impl<'a> Handler<'a> for IgnoreHandler {
    fn handle(&mut self, event: &Event<'_>, _options: &ImportOptions) -> Signal<'a> {
        match event {
            Event::ObjectStart | Event::ArrayStart => {
                self.nesting += 1;
                Signal::Continue
            }
            Event::ObjectEnd | Event::ArrayEnd => match self.nesting {
                0 => unexpected(event),
                1 => Signal::Pop,
                _ => {
                    self.nesting -= 1;
                    Signal::Continue
                }
            },
            Event::Key(_) if self.nesting > 0 => Signal::Continue,
            Event::Key(_) => unexpected(event),
            _ if event.is_scalar() && self.nesting == 0 => Signal::Pop,
            _ => Signal::Continue,
        }
    }

    fn role(&self) -> String {
        String::from("ignored value")
    }
}

#[cfg(test)]
mod tests {
    use alloc::{string::ToString, vec};

    use bstr::BStr;

    use super::*;
    use crate::{
        error::Mismatch,
        handler::testing::{Answer, drive},
    };

    #[test]
    fn scalar_pops_immediately() {
        let mut handler = IgnoreHandler::new();
        assert_eq!(drive(&mut handler, &[Event::Null]), vec![Answer::Pop]);
    }

    #[test]
    fn nested_value_pops_at_matching_end() {
        let mut handler = IgnoreHandler::new();
        let answers = drive(&mut handler, &[
            Event::ObjectStart,
            Event::Key(BStr::new("a")),
            Event::ArrayStart,
            Event::UnsignedInt(1),
            Event::ObjectStart,
            Event::ObjectEnd,
            Event::ArrayEnd,
            Event::Key(BStr::new("b")),
            Event::String(BStr::new("x")),
            Event::ObjectEnd,
        ]);
        let mut expected = vec![Answer::Continue; 9];
        expected.push(Answer::Pop);
        assert_eq!(answers, expected);
    }

    #[test]
    fn refuses_key_or_end_at_top() {
        let mut handler = IgnoreHandler::new();
        assert_eq!(
            drive(&mut handler, &[Event::Key(BStr::new("k")), Event::ArrayEnd]),
            vec![
                Answer::Fail(Mismatch::UnexpectedEvent("key \"k\"".to_string())),
                Answer::Fail(Mismatch::UnexpectedEvent("array end".to_string())),
            ]
        );
    }
}
