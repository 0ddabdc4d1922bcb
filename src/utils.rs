pub fn to_hex_str<T>(bytes: &T) -> String
where
    T: AsRef<[u8]> + ?Sized,
{
    let x = bytes.as_ref();

    x.iter()
        .map(|v| format!("{:02x}", v))
        .collect::<Vec<String>>()
        .join("")
}

pub trait IndentString {
    fn indent(&self, n: usize) -> String;
}

impl<T> IndentString for T
where
    T: AsRef<str> + ?Sized,
{
    fn indent(&self, n: usize) -> String {
        let pad = " ".repeat(n);

        self.as_ref()
            .lines()
            .map(|line| format!("{}{}", pad, line))
            .collect::<Vec<String>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_is_lowercase_without_separators() {
        assert_eq!(to_hex_str(&[0x00u8, 0xab, 0x7f]), "00ab7f");
        assert_eq!(to_hex_str(&Vec::<u8>::new()), "");
    }

    #[test]
    fn indent_every_line() {
        assert_eq!("a\nb".indent(2), "  a\n  b");
    }
}
