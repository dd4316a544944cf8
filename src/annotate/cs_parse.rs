use crate::error::{DemuxError, Result};

/// Reference base used in adapter templates for the variable index region
pub const MASK_BASE: u8 = b'n';

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CsOp {
    /// `:N`, short form identical stretch
    Match(usize),
    /// `=ACGT`, long form identical stretch
    Identity(Vec<u8>),
    /// `*rq`, reference base followed by query base
    Sub { reference: u8, query: u8 },
    /// `+acgt`, bases only in the query
    Ins(Vec<u8>),
    /// `-acgt`, bases only in the reference
    Del(Vec<u8>),
    /// `~gt12ag`, spliced region
    Intron { donor: [u8; 2], len: usize, acceptor: [u8; 2] },
}

impl CsOp {
    /// Query base of a substitution against a masked reference position
    pub fn masked_query_base(&self) -> Option<u8> {
        match self {
            CsOp::Sub { reference, query } if reference.to_ascii_lowercase() == MASK_BASE => {
                let query = query.to_ascii_lowercase();
                matches!(query, b'a' | b'c' | b'g' | b't').then_some(query)
            }
            _ => None,
        }
    }
}

fn invalid(cs: &str, reason: String) -> DemuxError {
    DemuxError::InvalidCs {
        cs: cs.to_string(),
        reason,
    }
}

fn take_while(bytes: &[u8], pos: usize, pred: impl Fn(u8) -> bool) -> usize {
    bytes[pos..].iter().take_while(|&&b| pred(b)).count()
}

fn parse_count(cs: &str, digits: &[u8], pos: usize) -> Result<usize> {
    std::str::from_utf8(digits)
        .ok()
        .and_then(|d| d.parse().ok())
        .ok_or_else(|| invalid(cs, format!("expected a length at offset {pos}")))
}

/// Split a cs string (without the `cs:Z:` marker) into its operations
pub fn tokenize_cs(cs: &str) -> Result<Vec<CsOp>> {
    let bytes = cs.as_bytes();
    let mut ops = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        let op = bytes[pos];
        pos += 1;
        match op {
            b':' => {
                let n = take_while(bytes, pos, |b| b.is_ascii_digit());
                if n == 0 {
                    return Err(invalid(cs, format!("empty match length at offset {pos}")));
                }
                ops.push(CsOp::Match(parse_count(cs, &bytes[pos..pos + n], pos)?));
                pos += n;
            }
            b'=' | b'+' | b'-' => {
                let n = take_while(bytes, pos, |b| b.is_ascii_alphabetic());
                if n == 0 {
                    return Err(invalid(cs, format!("'{}' without bases at offset {pos}", op as char)));
                }
                let seq = bytes[pos..pos + n].to_vec();
                ops.push(match op {
                    b'=' => CsOp::Identity(seq),
                    b'+' => CsOp::Ins(seq),
                    _ => CsOp::Del(seq),
                });
                pos += n;
            }
            b'*' => {
                if pos + 2 > bytes.len()
                    || !bytes[pos].is_ascii_alphabetic()
                    || !bytes[pos + 1].is_ascii_alphabetic()
                {
                    return Err(invalid(cs, format!("truncated substitution at offset {pos}")));
                }
                ops.push(CsOp::Sub {
                    reference: bytes[pos],
                    query: bytes[pos + 1],
                });
                pos += 2;
            }
            b'~' => {
                if pos + 2 > bytes.len() {
                    return Err(invalid(cs, format!("truncated intron at offset {pos}")));
                }
                let donor = [bytes[pos], bytes[pos + 1]];
                pos += 2;
                let n = take_while(bytes, pos, |b| b.is_ascii_digit());
                let len = parse_count(cs, &bytes[pos..pos + n], pos)?;
                pos += n;
                if pos + 2 > bytes.len() {
                    return Err(invalid(cs, format!("truncated intron at offset {pos}")));
                }
                let acceptor = [bytes[pos], bytes[pos + 1]];
                pos += 2;
                ops.push(CsOp::Intron { donor, len, acceptor });
            }
            other => {
                return Err(invalid(
                    cs,
                    format!("unexpected '{}' at offset {}", other as char, pos - 1),
                ));
            }
        }
    }

    Ok(ops)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_all_ops() {
        let ops = tokenize_cs(":6*na=ACG+tt-c~gt12ag*ag").unwrap();
        assert_eq!(
            ops,
            vec![
                CsOp::Match(6),
                CsOp::Sub { reference: b'n', query: b'a' },
                CsOp::Identity(b"ACG".to_vec()),
                CsOp::Ins(b"tt".to_vec()),
                CsOp::Del(b"c".to_vec()),
                CsOp::Intron { donor: *b"gt", len: 12, acceptor: *b"ag" },
                CsOp::Sub { reference: b'a', query: b'g' },
            ]
        );
    }

    #[test]
    fn test_empty_cs() {
        assert!(tokenize_cs("").unwrap().is_empty());
    }

    #[test]
    fn test_masked_query_base() {
        assert_eq!(CsOp::Sub { reference: b'n', query: b'c' }.masked_query_base(), Some(b'c'));
        assert_eq!(CsOp::Sub { reference: b'N', query: b'G' }.masked_query_base(), Some(b'g'));
        // Unknown query base does not contribute
        assert_eq!(CsOp::Sub { reference: b'n', query: b'n' }.masked_query_base(), None);
        assert_eq!(CsOp::Sub { reference: b'a', query: b'c' }.masked_query_base(), None);
        assert_eq!(CsOp::Ins(b"n".to_vec()).masked_query_base(), None);
    }

    #[test]
    fn test_insertion_does_not_swallow_substitution() {
        // "+na" is an insertion of "na", not a masked substitution
        let ops = tokenize_cs(":3+na*nt").unwrap();
        assert_eq!(ops[1], CsOp::Ins(b"na".to_vec()));
        assert_eq!(ops[2], CsOp::Sub { reference: b'n', query: b't' });
    }

    #[test]
    fn test_malformed_cs() {
        assert!(matches!(tokenize_cs(":"), Err(DemuxError::InvalidCs { .. })));
        assert!(tokenize_cs(":5*n").is_err());
        assert!(tokenize_cs("*n:").is_err());
        assert!(tokenize_cs("+").is_err());
        assert!(tokenize_cs("?acg").is_err());
        assert!(tokenize_cs("~gt12").is_err());
    }
}
