//! Question bank CSV parser.
//!
//! Bank files use the columns 题号 (id), 题干 (stem), A-E (option text),
//! 答案 (answer), 难度 (difficulty), 题型 (type) and 类别 (category). Files
//! in the wild are a mix of UTF-8 and GBK, so decoding falls back through
//! GBK to GB18030. Bad rows are skipped and reported; only file-level
//! problems abort the import.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::{ImportError, Result};
use crate::types::Question;

const OPTION_LETTERS: [&str; 5] = ["A", "B", "C", "D", "E"];
const DEFAULT_CATEGORY: &str = "未分类";

/// A skipped row with the 1-based line it came from.
#[derive(Debug, Clone, Serialize)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Outcome of parsing one bank file.
#[derive(Debug, Clone)]
pub struct ParsedBank {
    pub questions: Vec<Question>,
    pub row_errors: Vec<RowError>,
}

/// Decode raw bank bytes, trying UTF-8 (BOM stripped), then GBK, then
/// GB18030. Returns the content and the encoding that produced it.
pub fn decode_bank(bytes: &[u8]) -> (String, &'static str) {
    if let Ok(content) = std::str::from_utf8(bytes) {
        let content = content.strip_prefix('\u{FEFF}').unwrap_or(content);
        return (content.to_string(), "UTF-8");
    }

    let (decoded, _, had_errors) = encoding_rs::GBK.decode(bytes);
    if !had_errors {
        return (decoded.into_owned(), "GBK");
    }

    let (decoded, _, _) = encoding_rs::GB18030.decode(bytes);
    (decoded.into_owned(), "GB18030")
}

/// Parse decoded CSV content into questions.
pub fn parse_bank(content: &str) -> Result<ParsedBank> {
    if content.trim().is_empty() {
        return Err(ImportError::EmptyFile);
    }

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers = reader.headers()?.clone();
    let column = |name: &'static str| -> Result<usize> {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or(ImportError::MissingColumn(name))
    };

    let id_col = column("题号")?;
    let stem_col = column("题干")?;
    let answer_col = column("答案")?;
    let difficulty_col = headers.iter().position(|h| h == "难度");
    let type_col = headers.iter().position(|h| h == "题型");
    let category_col = headers.iter().position(|h| h == "类别");
    let option_cols: Vec<(usize, &str)> = OPTION_LETTERS
        .iter()
        .filter_map(|letter| {
            headers
                .iter()
                .position(|h| h == *letter)
                .map(|col| (col, *letter))
        })
        .collect();

    let mut questions = Vec::new();
    let mut row_errors = Vec::new();

    // Line 1 is the header row.
    for (index, record) in reader.records().enumerate() {
        let line = index + 2;
        let record = match record {
            Ok(record) => record,
            Err(err) => {
                row_errors.push(RowError {
                    line,
                    message: err.to_string(),
                });
                continue;
            }
        };

        let field = |col: usize| record.get(col).unwrap_or("").trim();

        let id = field(id_col);
        let stem = field(stem_col);
        if id.is_empty() || stem.is_empty() {
            row_errors.push(RowError {
                line,
                message: "missing 题号 or 题干".to_string(),
            });
            continue;
        }

        // Empty cells are left out so option-less questions store {}.
        let mut options = BTreeMap::new();
        for (col, letter) in &option_cols {
            let text = field(*col);
            if !text.is_empty() {
                options.insert((*letter).to_string(), text.to_string());
            }
        }

        let labeled = |col: Option<usize>| -> Option<String> {
            col.map(|c| field(c))
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        questions.push(Question {
            id: id.to_string(),
            stem: stem.to_string(),
            answer: field(answer_col).to_string(),
            difficulty: labeled(difficulty_col),
            qtype: labeled(type_col),
            category: labeled(category_col).or_else(|| Some(DEFAULT_CATEGORY.to_string())),
            options,
        });
    }

    Ok(ParsedBank {
        questions,
        row_errors,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = "\
题号,题干,A,B,C,D,E,答案,难度,题型,类别
1,What is 1+1?,1,2,3,,,B,易,单选题,算术
2,Pick the primes,2,3,4,5,,ABD,中,多选题,算术
3,True or false?,,,,,,A,难,判断题,
";

    #[test]
    fn parses_well_formed_rows() {
        let bank = parse_bank(SAMPLE).unwrap();
        assert_eq!(bank.questions.len(), 3);
        assert!(bank.row_errors.is_empty());

        let first = &bank.questions[0];
        assert_eq!(first.id, "1");
        assert_eq!(first.answer, "B");
        assert_eq!(first.options.len(), 3);
        assert_eq!(first.options["B"], "2");
        assert_eq!(first.category.as_deref(), Some("算术"));
    }

    #[test]
    fn empty_option_cells_store_empty_options() {
        let bank = parse_bank(SAMPLE).unwrap();
        let third = &bank.questions[2];
        assert!(third.options.is_empty());
        assert_eq!(third.category.as_deref(), Some("未分类"));
    }

    #[test]
    fn bad_rows_are_skipped_not_fatal() {
        let content = "\
题号,题干,A,B,答案,难度,题型,类别
1,Valid question,x,y,A,易,单选题,misc
,Missing id,x,y,A,易,单选题,misc
3,,x,y,A,易,单选题,misc
";
        let bank = parse_bank(content).unwrap();
        assert_eq!(bank.questions.len(), 1);
        assert_eq!(bank.row_errors.len(), 2);
        assert_eq!(bank.row_errors[0].line, 3);
        assert_eq!(bank.row_errors[1].line, 4);
    }

    #[test]
    fn missing_required_column_is_fatal() {
        let content = "题干,答案\nstem,A\n";
        assert!(matches!(
            parse_bank(content),
            Err(ImportError::MissingColumn("题号"))
        ));
    }

    #[test]
    fn empty_file_is_fatal() {
        assert!(matches!(parse_bank("  \n"), Err(ImportError::EmptyFile)));
    }

    #[test]
    fn decodes_utf8_with_bom() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice("题号,题干,答案\n".as_bytes());
        let (content, encoding) = decode_bank(&bytes);
        assert_eq!(encoding, "UTF-8");
        assert!(content.starts_with("题号"));
    }

    #[test]
    fn decodes_gbk_fallback() {
        let (bytes, _, _) = encoding_rs::GBK.encode("题号,题干,答案\n");
        let (content, encoding) = decode_bank(&bytes);
        assert_eq!(encoding, "GBK");
        assert!(content.starts_with("题号"));
    }
}
