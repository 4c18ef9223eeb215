use crate::token::Keyword;

pub fn to_keyword(s: &str) -> Option<Keyword> {
    use Keyword::*;
    let kw = match s {
        "BEGIN" => Begin,
        "END" => End,
        "CONST" => Const,
        "TYPE" => Type,
        "VAR" => Var,
        "ARRAY" => Array,
        "OF" => Of,
        "RECORD" => Record,
        "IF" => If,
        "THEN" => Then,
        "ELSE" => Else,
        "WHILE" => While,
        "DO" => Do,
        "REPEAT" => Repeat,
        "UNTIL" => Until,
        "READ" => Read,
        "WRITE" => Write,
        "DIV" => Div,
        "MOD" => Mod,
        _ => return None,
    };
    Some(kw)
}
