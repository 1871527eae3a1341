use std::fmt::Write;

const BYTES_PER_DECODE_LINE: usize = 18;

/// write bytes as space separated hex, one line per chunk
pub(crate) fn format_bytes(f: &mut std::fmt::Formatter, bytes: &[u8]) -> std::fmt::Result {
    for chunk in bytes.chunks(BYTES_PER_DECODE_LINE) {
        writeln!(f)?;
        let mut first = true;
        for byte in chunk {
            if !first {
                f.write_char(' ')?;
            }
            first = false;
            write!(f, "{byte:02X}")?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Hex<'a>(&'a [u8]);

    impl std::fmt::Display for Hex<'_> {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            format_bytes(f, self.0)
        }
    }

    #[test]
    fn splits_long_payloads_into_lines() {
        let bytes: Vec<u8> = (0..20).collect();
        let text = Hex(&bytes).to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "");
        assert!(lines[1].starts_with("00 01 02"));
        assert_eq!(lines[2], "12 13");
    }
}
