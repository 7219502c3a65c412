//! ContentTokenizer (§4.9): same lexical rules as the object tokenizer, but
//! "operators" are operator names rather than `obj`/`endobj`/`R` structure.
//! Operands accumulate on a small stack until a keyword token appears; that
//! keyword is the operator and the accumulated stack is its operand vector.
//! There is no `obj`/`endobj`/`R` handling inside content streams.

use crate::error::Result;
use crate::model::PDFObject;
use crate::parser::lexer::{next_token, skip_whitespace, Token};

/// One operator invocation: its name and the operands that preceded it.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentOp {
    pub operator: String,
    pub operands: Vec<PDFObject>,
}

/// Parse an entire content stream into a flat sequence of operator
/// invocations. Inline images (`BI ... ID ... EI`) are handled specially
/// because their data segment is raw bytes, not further tokens: after `ID`,
/// scan forward for the next occurrence of whitespace + `EI` + (whitespace
/// or EOF), per common practice for streams without an explicit length.
pub fn tokenize_content(data: &[u8]) -> Result<Vec<ContentOp>> {
    let mut ops = Vec::new();
    let mut operands: Vec<PDFObject> = Vec::new();
    let mut pos = 0usize;

    while pos < data.len() {
        let before = pos;
        let (token, next) = next_token(data, pos)?;
        match token {
            Token::Eof => break,
            Token::Int(n) => {
                operands.push(PDFObject::Int(n));
                pos = next;
            }
            Token::Real(r) => {
                operands.push(PDFObject::Real(r));
                pos = next;
            }
            Token::Name(n) => {
                operands.push(PDFObject::Name(n));
                pos = next;
            }
            Token::String { bytes, is_hex } => {
                operands.push(PDFObject::String { bytes, is_hex });
                pos = next;
            }
            Token::ArrayOpen => {
                let (arr, after) = parse_content_array(data, next)?;
                operands.push(arr);
                pos = after;
            }
            Token::DictOpen => {
                let (dict, after) = parse_content_dict(data, next)?;
                operands.push(dict);
                pos = after;
            }
            Token::Stream | Token::EndStream | Token::ArrayClose | Token::DictClose => {
                // Malformed in this position; skip defensively.
                pos = next;
            }
            Token::Keyword(kw) => {
                let name = String::from_utf8_lossy(&kw).into_owned();
                if name == "BI" {
                    let (op, after) = parse_inline_image(data, next)?;
                    ops.push(op);
                    operands.clear();
                    pos = after;
                } else {
                    ops.push(ContentOp {
                        operator: name,
                        operands: std::mem::take(&mut operands),
                    });
                    pos = next;
                }
            }
        }
        if pos == before {
            // Defensive: never spin forever on an unrecognized byte.
            pos += 1;
        }
    }
    Ok(ops)
}

fn parse_content_array(data: &[u8], mut pos: usize) -> Result<(PDFObject, usize)> {
    let mut items = Vec::new();
    loop {
        let peek_pos = skip_whitespace(data, pos);
        let (peek, after) = next_token(data, peek_pos)?;
        match peek {
            Token::ArrayClose => return Ok((PDFObject::Array(items), after)),
            Token::Eof => return Ok((PDFObject::Array(items), pos)),
            Token::Int(n) => {
                items.push(PDFObject::Int(n));
                pos = after;
            }
            Token::Real(r) => {
                items.push(PDFObject::Real(r));
                pos = after;
            }
            Token::Name(n) => {
                items.push(PDFObject::Name(n));
                pos = after;
            }
            Token::String { bytes, is_hex } => {
                items.push(PDFObject::String { bytes, is_hex });
                pos = after;
            }
            Token::ArrayOpen => {
                let (arr, next) = parse_content_array(data, after)?;
                items.push(arr);
                pos = next;
            }
            _ => pos = after,
        }
    }
}

fn parse_content_dict(data: &[u8], mut pos: usize) -> Result<(PDFObject, usize)> {
    let mut dict = crate::model::Dictionary::new();
    loop {
        let peek_pos = skip_whitespace(data, pos);
        let (peek, after) = next_token(data, peek_pos)?;
        match peek {
            Token::DictClose => return Ok((PDFObject::Dict(dict), after)),
            Token::Eof => return Ok((PDFObject::Dict(dict), pos)),
            Token::Name(key) => {
                let peek2_pos = skip_whitespace(data, after);
                let (value_tok, after_val) = next_token(data, peek2_pos)?;
                let (value, final_pos) = match value_tok {
                    Token::Int(n) => (PDFObject::Int(n), after_val),
                    Token::Real(r) => (PDFObject::Real(r), after_val),
                    Token::Name(n) => (PDFObject::Name(n), after_val),
                    Token::String { bytes, is_hex } => {
                        (PDFObject::String { bytes, is_hex }, after_val)
                    }
                    Token::ArrayOpen => parse_content_array(data, after_val)?,
                    Token::DictOpen => parse_content_dict(data, after_val)?,
                    _ => (PDFObject::Null, after_val),
                };
                dict.insert(key, value);
                pos = final_pos;
            }
            _ => pos = after,
        }
    }
}

fn parse_inline_image(data: &[u8], mut pos: usize) -> Result<(ContentOp, usize)> {
    let mut dict = crate::model::Dictionary::new();
    loop {
        let peek_pos = skip_whitespace(data, pos);
        let (peek, after) = next_token(data, peek_pos)?;
        match peek {
            Token::Keyword(ref kw) if kw == b"ID" => {
                pos = after;
                break;
            }
            Token::Eof => {
                pos = after;
                break;
            }
            Token::Name(key) => {
                let peek2_pos = skip_whitespace(data, after);
                let (value_tok, after_val) = next_token(data, peek2_pos)?;
                let value = match value_tok {
                    Token::Int(n) => PDFObject::Int(n),
                    Token::Real(r) => PDFObject::Real(r),
                    Token::Name(n) => PDFObject::Name(n),
                    Token::String { bytes, is_hex } => PDFObject::String { bytes, is_hex },
                    _ => PDFObject::Null,
                };
                dict.insert(key, value);
                pos = after_val;
            }
            _ => pos = after,
        }
    }
    // Exactly one whitespace byte separates ID from the raw data, by convention.
    if pos < data.len() && crate::parser::lexer::is_whitespace(data[pos]) {
        pos += 1;
    }
    let data_start = pos;
    let end = find_ei(data, data_start);
    let image_data = data[data_start..end].to_vec();
    let after_ei = (end + 2).min(data.len());
    Ok((
        ContentOp {
            operator: "BI".to_string(),
            operands: vec![PDFObject::Dict(dict), PDFObject::string(image_data)],
        },
        after_ei,
    ))
}

fn find_ei(data: &[u8], from: usize) -> usize {
    let mut i = from;
    while i + 2 <= data.len() {
        if &data[i..i + 2] == b"EI"
            && (i == from || crate::parser::lexer::is_whitespace(data[i - 1]))
            && (i + 2 == data.len() || crate::parser::lexer::is_whitespace(data[i + 2]))
        {
            let mut end = i;
            if end > from && crate::parser::lexer::is_whitespace(data[end - 1]) {
                end -= 1;
            }
            return end;
        }
        i += 1;
    }
    data.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_rectangles() {
        let data = b"10 20 100 50 re f 200 300 80 80 re S";
        let ops = tokenize_content(data).unwrap();
        assert_eq!(ops.len(), 4);
        assert_eq!(ops[0].operator, "re");
        assert_eq!(ops[0].operands.len(), 4);
        assert_eq!(ops[1].operator, "f");
        assert!(ops[1].operands.is_empty());
    }

    #[test]
    fn unknown_operator_clears_operands() {
        let data = b"1 2 zzz 3 4 re f";
        let ops = tokenize_content(data).unwrap();
        assert_eq!(ops[0].operator, "zzz");
        assert_eq!(ops[0].operands, vec![PDFObject::Int(1), PDFObject::Int(2)]);
        assert_eq!(ops[1].operator, "re");
        assert_eq!(ops[1].operands.len(), 4);
    }

    #[test]
    fn array_operand_for_tj() {
        let data = b"[(Hello) -250 (World)] TJ";
        let ops = tokenize_content(data).unwrap();
        assert_eq!(ops[0].operator, "TJ");
        let arr = ops[0].operands[0].as_array().unwrap();
        assert_eq!(arr.len(), 3);
    }
}
