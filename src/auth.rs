use anyhow::{Result, bail};
use std::io::{self, BufRead, IsTerminal};
use zeroize::Zeroizing;

pub const PIN_ENV: &str = "STEGKEY_PIN";

fn pin_from_env() -> Option<Zeroizing<String>> {
    //  STEGKEY_PIN=123456 stegkey decrypt report.pdf.enc ...
    let pin = Zeroizing::new(std::env::var(PIN_ENV).ok()?);
    (!pin.is_empty()).then_some(pin)
}

pub fn read_pin() -> Result<Zeroizing<String>> {
    if let Some(pin) = pin_from_env() {
        return Ok(pin);
    }

    //  echo 123456 | stegkey decrypt ...
    if !io::stdin().is_terminal() {
        let mut buf = Zeroizing::new(String::new());
        io::stdin().read_line(&mut buf)?;
        trim_newline(&mut buf);

        if !buf.is_empty() {
            return Ok(buf);
        }
    }

    if io::stdin().is_terminal() {
        let pin = Zeroizing::new(rpassword::prompt_password("PIN: ")?);
        if !pin.is_empty() {
            return Ok(pin);
        }
    }

    bail!("No PIN provided")
}

pub fn read_new_pin_with_confirmation() -> Result<Zeroizing<String>> {
    if let Some(pin) = pin_from_env() {
        return Ok(pin);
    }

    if !io::stdin().is_terminal() {
        let stdin = io::stdin();
        let mut handle = stdin.lock();

        let mut pin1 = Zeroizing::new(String::new());
        let mut pin2 = Zeroizing::new(String::new());

        handle.read_line(&mut pin1)?;
        handle.read_line(&mut pin2)?;

        trim_newline(&mut pin1);
        trim_newline(&mut pin2);

        return confirm(pin1, pin2);
    }

    let pin1 = Zeroizing::new(rpassword::prompt_password("New PIN (6 digits): ")?);
    let pin2 = Zeroizing::new(rpassword::prompt_password("Confirm PIN: ")?);

    confirm(pin1, pin2)
}

fn confirm(pin1: Zeroizing<String>, pin2: Zeroizing<String>) -> Result<Zeroizing<String>> {
    if pin1.is_empty() {
        bail!("PIN cannot be empty");
    }

    if pin1 != pin2 {
        bail!("PINs do not match");
    }

    Ok(pin1)
}

fn trim_newline(s: &mut String) {
    while s.ends_with('\n') || s.ends_with('\r') {
        s.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pin(s: &str) -> Zeroizing<String> {
        Zeroizing::new(s.to_string())
    }

    #[test]
    fn matching_pins_are_accepted() {
        assert_eq!(confirm(pin("123456"), pin("123456")).unwrap().as_str(), "123456");
    }

    #[test]
    fn mismatched_pins_are_rejected() {
        let err = confirm(pin("123456"), pin("123457")).unwrap_err();
        assert_eq!(err.to_string(), "PINs do not match");
    }

    #[test]
    fn empty_pin_is_rejected() {
        assert!(confirm(pin(""), pin("")).is_err());
    }

    #[test]
    fn trailing_line_endings_are_stripped() {
        let mut s = String::from("123456\r\n");
        trim_newline(&mut s);
        assert_eq!(s, "123456");

        let mut s = String::from("123456");
        trim_newline(&mut s);
        assert_eq!(s, "123456");
    }
}
