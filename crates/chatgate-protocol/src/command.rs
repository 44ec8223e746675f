//! Command parsing: one decoded line → verb + argument remainder.

/// A decoded command line, split exactly once on the first space.
///
/// The verb is upper-cased so lookups are case-insensitive; the remainder
/// is kept verbatim for the handler to interpret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command<'a> {
    verb: String,
    args: &'a str,
}

impl<'a> Command<'a> {
    /// Parses a line. Returns `None` for a blank line.
    pub fn parse(line: &'a str) -> Option<Self> {
        let line = line.trim_start();
        if line.trim_end().is_empty() {
            return None;
        }
        let (verb, args) = match line.split_once(' ') {
            Some((verb, args)) => (verb, args),
            None => (line.trim_end(), ""),
        };
        Some(Self {
            verb: verb.to_ascii_uppercase(),
            args,
        })
    }

    /// The upper-cased verb.
    pub fn verb(&self) -> &str {
        &self.verb
    }

    /// Everything after the first space, untouched.
    pub fn args(&self) -> &'a str {
        self.args
    }

    /// The first space-separated argument, with any leading `:` removed.
    pub fn first_arg(&self) -> Option<&'a str> {
        self.args
            .split(' ')
            .find(|s| !s.is_empty())
            .map(strip_colon)
            .filter(|s| !s.is_empty())
    }
}

/// Splits `args` at the first ` :` into the head and the trailing text.
///
/// ```rust
/// use chatgate_protocol::split_trailing;
///
/// assert_eq!(split_trailing("#osu :new topic"), ("#osu", Some("new topic")));
/// assert_eq!(split_trailing("#osu"), ("#osu", None));
/// ```
pub fn split_trailing(args: &str) -> (&str, Option<&str>) {
    match args.split_once(" :") {
        Some((head, trailing)) => (head.trim(), Some(trailing)),
        None => (args.trim(), None),
    }
}

/// Removes one leading `:` marking a trailing parameter.
pub fn strip_colon(text: &str) -> &str {
    text.strip_prefix(':').unwrap_or(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_splits_on_first_space_only() {
        let cmd = Command::parse("PRIVMSG #osu :hello there").unwrap();
        assert_eq!(cmd.verb(), "PRIVMSG");
        assert_eq!(cmd.args(), "#osu :hello there");
    }

    #[test]
    fn test_parse_uppercases_verb() {
        let cmd = Command::parse("join #osu").unwrap();
        assert_eq!(cmd.verb(), "JOIN");
    }

    #[test]
    fn test_parse_verb_without_args() {
        let cmd = Command::parse("LIST").unwrap();
        assert_eq!(cmd.verb(), "LIST");
        assert_eq!(cmd.args(), "");
    }

    #[test]
    fn test_parse_blank_line_is_none() {
        assert!(Command::parse("").is_none());
        assert!(Command::parse("   ").is_none());
    }

    #[test]
    fn test_first_arg_strips_colon() {
        let cmd = Command::parse("PASS :token123").unwrap();
        assert_eq!(cmd.first_arg(), Some("token123"));
    }

    #[test]
    fn test_first_arg_skips_extra_spaces() {
        let cmd = Command::parse("PART   #lobby extra").unwrap();
        assert_eq!(cmd.first_arg(), Some("#lobby"));
    }

    #[test]
    fn test_first_arg_missing() {
        let cmd = Command::parse("NAMES").unwrap();
        assert_eq!(cmd.first_arg(), None);
    }

    #[test]
    fn test_split_trailing_keeps_later_colons() {
        assert_eq!(
            split_trailing("#osu :a :b"),
            ("#osu", Some("a :b"))
        );
    }

    #[test]
    fn test_strip_colon_only_once() {
        assert_eq!(strip_colon("::x"), ":x");
        assert_eq!(strip_colon("x"), "x");
    }
}
