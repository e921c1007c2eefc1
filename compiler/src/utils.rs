pub fn quote(text: &str) -> String {
    serde_json::to_string(text).unwrap_or_else(|_| format!("{:?}", text))
}

/// Decodes the body of a quoted literal (quotes included) into raw bytes,
/// following C escape rules.
pub fn unescape(literal: &str) -> Result<Vec<u8>, String> {
    let inner = literal
        .get(1..literal.len().saturating_sub(1))
        .ok_or_else(|| format!("malformed string literal {}", literal))?;

    let mut out = Vec::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            let mut buf = [0; 4];
            out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
            continue;
        }
        let Some(escape) = chars.next() else {
            return Err("string ends inside an escape sequence".to_string());
        };
        match escape {
            'n' => out.push(b'\n'),
            'r' => out.push(b'\r'),
            't' => out.push(b'\t'),
            'a' => out.push(0x07),
            'b' => out.push(0x08),
            'f' => out.push(0x0C),
            'v' => out.push(0x0B),
            '\\' | '\'' | '"' | '?' => out.push(escape as u8),
            'x' | 'X' => {
                let mut value = 0u32;
                let mut digits = 0;
                while let Some(d) = chars.peek().and_then(|c| c.to_digit(16)) {
                    if digits == 2 {
                        break;
                    }
                    value = value * 16 + d;
                    digits += 1;
                    chars.next();
                }
                if digits == 0 {
                    return Err("\\x used with no following hex digits".to_string());
                }
                out.push(value as u8);
            }
            '0'..='7' => {
                let mut value = escape.to_digit(8).unwrap_or(0);
                for _ in 0..2 {
                    match chars.peek().and_then(|c| c.to_digit(8)) {
                        Some(d) => {
                            value = value * 8 + d;
                            chars.next();
                        }
                        None => break,
                    }
                }
                if value > 0xFF {
                    return Err(format!("octal escape \\{:o} is out of range", value));
                }
                out.push(value as u8);
            }
            other => return Err(format!("unknown escape sequence \\{}", other)),
        }
    }
    Ok(out)
}
