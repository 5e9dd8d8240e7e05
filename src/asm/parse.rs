//! nom-based token parsers for operands: numeric literals, labels, and the
//! indirect-addressing sigils (`*N` and `(N)`).

use nom::branch::alt;
use nom::bytes::complete::{tag, tag_no_case, take_while1};
use nom::character::complete::digit1;
use nom::combinator::{map_res, opt};
use nom::sequence::delimited;
use nom::IResult;

/// A parsed operand: optionally indirect, plus either a numeric value or a
/// label reference to resolve against the symbol table later.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    Number(u16),
    Label(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedOperand {
    pub indirect: bool,
    pub value: Operand,
}

fn hex_literal(input: &str) -> IResult<&str, u16> {
    let (input, _) = tag_no_case("0x")(input)?;
    map_res(take_while1(|c: char| c.is_ascii_hexdigit()), |s| {
        u16::from_str_radix(s, 16)
    })(input)
}

fn bin_literal(input: &str) -> IResult<&str, u16> {
    let (input, _) = tag_no_case("0b")(input)?;
    map_res(take_while1(|c: char| c == '0' || c == '1'), |s| {
        u16::from_str_radix(s, 2)
    })(input)
}

fn dec_literal(input: &str) -> IResult<&str, u16> {
    map_res(digit1, |s: &str| s.parse::<u16>())(input)
}

/// Parse a bare numeric literal in decimal, `0x`, or `0b` form.
pub fn number_literal(input: &str) -> IResult<&str, u16> {
    alt((hex_literal, bin_literal, dec_literal))(input)
}

fn identifier(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_ascii_alphanumeric() || c == '_')(input)
}

/// Parse a `(N)`-wrapped indirect operand.
fn parens_indirect(input: &str) -> IResult<&str, &str> {
    delimited(tag("("), take_while1(|c: char| c != ')'), tag(")"))(input)
}

/// Parse an operand token: `*`-prefixed or `(...)`-wrapped marks indirect
/// addressing; the inner text is then itself a number or label.
pub fn operand(input: &str) -> IResult<&str, ParsedOperand> {
    let (rest, star) = opt(tag("*"))(input)?;
    let (rest, inner) = if star.is_some() {
        (rest, rest)
    } else if let Ok((rest2, inner)) = parens_indirect(rest) {
        (rest2, inner)
    } else {
        (rest, rest)
    };
    let indirect = star.is_some() || inner != rest;

    let inner = if star.is_some() { rest } else { inner };

    let value = if let Ok((_, n)) = number_literal(inner) {
        Operand::Number(n)
    } else if let Ok((_, id)) = identifier(inner) {
        Operand::Label(id.to_uppercase())
    } else {
        return Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Alt,
        )));
    };

    // Consume the rest of the input; operand tokens are whole-token parses.
    Ok(("", ParsedOperand { indirect, value }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_literal_forms() {
        assert_eq!(number_literal("35").unwrap().1, 35);
        assert_eq!(number_literal("0x1F").unwrap().1, 0x1F);
        assert_eq!(number_literal("0b1010").unwrap().1, 0b1010);
    }

    #[test]
    fn test_operand_direct_number() {
        let parsed = operand("16").unwrap().1;
        assert_eq!(
            parsed,
            ParsedOperand {
                indirect: false,
                value: Operand::Number(16)
            }
        );
    }

    #[test]
    fn test_operand_star_indirect() {
        let parsed = operand("*16").unwrap().1;
        assert_eq!(
            parsed,
            ParsedOperand {
                indirect: true,
                value: Operand::Number(16)
            }
        );
    }

    #[test]
    fn test_operand_paren_indirect() {
        let parsed = operand("(16)").unwrap().1;
        assert_eq!(
            parsed,
            ParsedOperand {
                indirect: true,
                value: Operand::Number(16)
            }
        );
    }

    #[test]
    fn test_operand_label() {
        let parsed = operand("LOOP").unwrap().1;
        assert_eq!(
            parsed,
            ParsedOperand {
                indirect: false,
                value: Operand::Label("LOOP".to_string())
            }
        );
    }
}
