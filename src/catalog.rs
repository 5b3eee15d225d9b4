//! Greeting catalog: localized hellos and their paired thank-you replies.

/// The six localized greetings, indexed 0..=5.
pub const HELLOS: [&str; 6] = [
    "Hello",
    "Bonjour",
    "Hola",
    "こんにちは",
    "Ciao",
    "안녕하세요",
];

const THANKS: &[(&str, &str)] = &[
    ("你好", "非常感谢"),
    ("Hello", "Thank you very much"),
    ("Bonjour", "Merci beaucoup"),
    ("Hola", "Muchas Gracias"),
    ("こんにちは", "どうも ありがとう ございます"),
    ("Ciao", "Mille Grazie"),
    ("안녕하세요", "대단히 감사합니다"),
];

/// Greeting for an index. Out-of-range values wrap onto the catalog
/// rather than failing.
pub fn greeting(index: usize) -> &'static str {
    HELLOS[index % HELLOS.len()]
}

/// Thank-you reply paired with a greeting. Unknown greetings get a
/// generic reply rather than an error.
pub fn thanks(greeting: &str) -> &'static str {
    THANKS
        .iter()
        .find(|(hello, _)| *hello == greeting)
        .map(|(_, reply)| *reply)
        .unwrap_or("Thank you")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_greeting_has_a_paired_reply() {
        for (index, hello) in HELLOS.iter().enumerate() {
            assert_eq!(greeting(index), *hello);
            assert_ne!(thanks(hello), "Thank you", "missing reply for {hello}");
        }
    }

    #[test]
    fn known_pairs() {
        assert_eq!(thanks(greeting(0)), "Thank you very much");
        assert_eq!(thanks(greeting(1)), "Merci beaucoup");
        assert_eq!(thanks("你好"), "非常感谢");
    }

    #[test]
    fn out_of_range_index_wraps() {
        assert_eq!(greeting(6), "Hello");
        assert_eq!(greeting(13), "Bonjour");
    }

    #[test]
    fn unknown_greeting_falls_back() {
        assert_eq!(thanks("Howdy"), "Thank you");
    }
}
