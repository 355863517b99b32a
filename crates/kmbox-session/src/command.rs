use kmbox_frame::{encode, Alphabet};

use crate::error::{Result, SessionError};

/// Function that asks the device to evaluate an encoded expression and
/// frame the reply.
pub const REPLY_REQUEST: &str = "r";

/// Function that installs a new alphabet on the device.
pub const SET_ALPHABET: &str = "nkb3";

/// One positional argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arg {
    /// Rendered as a decimal literal.
    Int(i64),
    /// Rendered verbatim inside single quotes.
    Text(String),
    /// Encoded under the session alphabet, then single-quoted.
    Encoded(String),
}

/// A device function call, rendered as `name(arg1,arg2,...)`.
///
/// Optional arguments that are absent at the end of the list are left out
/// entirely. An absent argument followed by a present one cannot be
/// expressed positionally and is rejected at format time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    name: String,
    args: Vec<Option<Arg>>,
}

impl Command {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
        }
    }

    /// `r('<encoded text>')`
    pub fn reply_request(text: impl Into<String>) -> Self {
        Self::new(REPLY_REQUEST).encoded(text)
    }

    /// `nkb3('<alphabet>')`. The alphabet travels verbatim.
    pub fn set_alphabet(alphabet: &Alphabet) -> Self {
        Self::new(SET_ALPHABET).text(alphabet.as_str())
    }

    pub fn int(self, value: i64) -> Self {
        self.arg(Some(Arg::Int(value)))
    }

    pub fn text(self, value: impl Into<String>) -> Self {
        self.arg(Some(Arg::Text(value.into())))
    }

    pub fn encoded(self, value: impl Into<String>) -> Self {
        self.arg(Some(Arg::Encoded(value.into())))
    }

    pub fn optional_int(self, value: Option<i64>) -> Self {
        self.arg(value.map(Arg::Int))
    }

    pub fn optional_text(self, value: Option<impl Into<String>>) -> Self {
        self.arg(value.map(|v| Arg::Text(v.into())))
    }

    pub fn arg(mut self, arg: Option<Arg>) -> Self {
        self.args.push(arg);
        self
    }

    /// Function name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Render the literal command text, without line terminator.
    pub fn format(&self, alphabet: &Alphabet) -> Result<String> {
        validate_name(&self.name)?;

        let present = self
            .args
            .iter()
            .rposition(Option::is_some)
            .map_or(0, |last| last + 1);

        let mut out = String::with_capacity(self.name.len() + 2 + present * 8);
        out.push_str(&self.name);
        out.push('(');
        for (index, arg) in self.args[..present].iter().enumerate() {
            if index > 0 {
                out.push(',');
            }
            match arg {
                Some(Arg::Int(value)) => out.push_str(&value.to_string()),
                Some(Arg::Text(value)) => {
                    validate_text(value, index)?;
                    out.push('\'');
                    out.push_str(value);
                    out.push('\'');
                }
                Some(Arg::Encoded(value)) => {
                    out.push('\'');
                    out.push_str(&encode(value.as_bytes(), alphabet));
                    out.push('\'');
                }
                None => {
                    return Err(SessionError::InvalidCommand(format!(
                        "{}: argument {index} is absent but a later argument is present",
                        self.name
                    )));
                }
            }
        }
        out.push(')');
        Ok(out)
    }
}

fn validate_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && !name.starts_with('.')
        && !name.ends_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.');
    if valid {
        Ok(())
    } else {
        Err(SessionError::InvalidCommand(format!(
            "invalid function name {name:?}"
        )))
    }
}

fn validate_text(value: &str, index: usize) -> Result<()> {
    match value
        .chars()
        .find(|c| matches!(c, '\'' | '\\' | '\r' | '\n'))
    {
        Some(c) => Err(SessionError::InvalidCommand(format!(
            "argument {index} contains {c:?}, which cannot appear in a quoted literal"
        ))),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reply_request_encodes_payload() {
        let line = Command::reply_request("A")
            .format(&Alphabet::default())
            .unwrap();
        assert_eq!(line, "r('JJ==')");
    }

    #[test]
    fn numeric_and_text_arguments() {
        let line = Command::new("km.move")
            .int(10)
            .int(-5)
            .format(&Alphabet::default())
            .unwrap();
        assert_eq!(line, "km.move(10,-5)");

        let line = Command::new("km.wheel")
            .int(i64::MIN)
            .int(0)
            .format(&Alphabet::default())
            .unwrap();
        assert_eq!(line, "km.wheel(-9223372036854775808,0)");

        let line = Command::new("km.print")
            .text("hello")
            .format(&Alphabet::default())
            .unwrap();
        assert_eq!(line, "km.print('hello')");
    }

    #[test]
    fn no_arguments() {
        let line = Command::new("km.version")
            .format(&Alphabet::default())
            .unwrap();
        assert_eq!(line, "km.version()");
    }

    #[test]
    fn trailing_absent_arguments_are_omitted() {
        let line = Command::new("km.move")
            .int(1)
            .int(2)
            .optional_int(None)
            .optional_text(None::<String>)
            .format(&Alphabet::default())
            .unwrap();
        assert_eq!(line, "km.move(1,2)");

        let line = Command::new("km.move")
            .int(1)
            .int(2)
            .optional_int(Some(8))
            .format(&Alphabet::default())
            .unwrap();
        assert_eq!(line, "km.move(1,2,8)");
    }

    #[test]
    fn interior_absent_argument_is_rejected() {
        let err = Command::new("km.move")
            .int(1)
            .optional_int(None)
            .int(3)
            .format(&Alphabet::default())
            .unwrap_err();
        assert!(matches!(err, SessionError::InvalidCommand(_)));
    }

    #[test]
    fn encoded_argument_follows_alphabet() {
        let standard: Alphabet = "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/"
            .parse()
            .unwrap();
        let line = Command::reply_request("A").format(&standard).unwrap();
        assert_eq!(line, "r('QQ==')");
    }

    #[test]
    fn set_alphabet_sends_alphabet_verbatim() {
        let alphabet = Alphabet::default();
        let line = Command::set_alphabet(&alphabet).format(&alphabet).unwrap();
        assert_eq!(line, format!("nkb3('{}')", kmbox_frame::DEFAULT_ALPHABET));
    }

    #[test]
    fn unquotable_text_is_rejected() {
        for bad in ["it's", "back\\slash", "line\nbreak", "cr\r"] {
            let err = Command::new("km.print")
                .text(bad)
                .format(&Alphabet::default())
                .unwrap_err();
            assert!(matches!(err, SessionError::InvalidCommand(_)), "{bad:?}");
        }
    }

    #[test]
    fn invalid_names_are_rejected() {
        for bad in ["", "km move", "km.", ".move", "r('x')"] {
            let err = Command::new(bad).format(&Alphabet::default()).unwrap_err();
            assert!(matches!(err, SessionError::InvalidCommand(_)), "{bad:?}");
        }
    }
}
