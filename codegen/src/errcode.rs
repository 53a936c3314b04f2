use anyhow::{Context, Result, bail};
use std::{collections::BTreeMap, fmt::Write};

/// One `Section:` of `errcodes.txt` with its codes.
///
/// ```text
/// Section: Class HV - Foreign Data Wrapper Error (SQL/MED)
/// ```
#[derive(Debug, Default)]
pub struct Section {
    /// e.g. `Class HV - Foreign Data Wrapper Error (SQL/MED)`
    pub title: String,
    pub codes: Vec<ErrCode>,
}

#[derive(Debug)]
pub struct ErrCode {
    /// 5 character SQLSTATE conventions
    pub sqlstate: String,
    /// E/W/S
    pub status: char,
    pub errcode_macro_name: String,
    pub spec_name: Option<String>,
}

impl ErrCode {
    /// `ERRCODE_UNDEFINED_TABLE` into `UndefinedTable`
    fn variant_name(&self) -> String {
        self.errcode_macro_name
            .trim_start_matches("ERRCODE_")
            .split('_')
            .flat_map(|word| {
                let mut chars = word.chars();
                let head = chars.next().map(|c| c.to_ascii_uppercase());
                head.into_iter().chain(chars.map(|c| c.to_ascii_lowercase()))
            })
            .collect()
    }
}

/// Sections keyed by 2 character class.
pub type ErrCodes = BTreeMap<String, Section>;

/// Parse `errcodes.txt`.
///
/// Blank lines and `#` comments are skipped, every other line is either a
/// section header or `sqlstate E/W/S macro_name [spec_name]`.
pub fn parse(source: &str) -> Result<ErrCodes> {
    let mut errcodes = ErrCodes::new();
    let mut class = None::<String>;

    for (i, line) in source.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let lineno = i + 1;

        if let Some(title) = line.strip_prefix("Section:") {
            let title = title.trim();
            let code = title
                .strip_prefix("Class ")
                .and_then(|t| t.get(..2))
                .with_context(|| format!("line {lineno}: expected `Class XX` in {title:?}"))?;
            errcodes.insert(code.to_owned(), Section { title: title.to_owned(), codes: vec![] });
            class = Some(code.to_owned());
            continue;
        }

        let Some(section) = class.as_ref().and_then(|c| errcodes.get_mut(c)) else {
            bail!("line {lineno}: error code before any section");
        };

        let mut words = line.split_whitespace();
        let (Some(sqlstate), Some(status), Some(macro_name)) = (words.next(), words.next(), words.next()) else {
            bail!("line {lineno}: expected `sqlstate status macro_name`, found {line:?}");
        };
        if sqlstate.len() != 5 {
            bail!("line {lineno}: invalid sqlstate `{sqlstate}`");
        }
        let status = match status {
            "E" => 'E',
            "W" => 'W',
            "S" => 'S',
            _ => bail!("line {lineno}: invalid status `{status}`"),
        };

        section.codes.push(ErrCode {
            sqlstate: sqlstate.to_owned(),
            status,
            errcode_macro_name: macro_name.to_owned(),
            spec_name: words.next().map(str::to_owned),
        });
    }

    Ok(errcodes)
}

/// Render the `sqlstate!` invocation, error status codes only.
///
/// Class without error status code is skipped, class without
/// generic `000` subclass have no class level entry.
pub fn render(errcodes: &ErrCodes) -> String {
    let mut codes = String::new();
    let mut classes = String::new();

    for (class, section) in errcodes {
        let errs = section.codes.iter().filter(|e| e.status == 'E').collect::<Vec<_>>();
        if errs.is_empty() {
            continue;
        }

        let title = &section.title;
        if !codes.is_empty() {
            codes.push('\n');
        }
        let _ = writeln!(codes, "        // {title}");

        for e in &errs {
            match &e.spec_name {
                Some(spec) => { let _ = writeln!(codes, "        /// `{}` {spec}", e.sqlstate); },
                None => { let _ = writeln!(codes, "        /// `{}`", e.sqlstate); },
            }
            let _ = writeln!(codes, "        {} = \"{}\",", e.variant_name(), e.sqlstate);
        }

        let generic = format!("{class}000");
        if let Some(e) = errs.iter().find(|e| e.sqlstate == generic) {
            let _ = writeln!(classes, "        // {title}");
            let _ = writeln!(classes, "        \"{class}\" => {},", e.variant_name());
        }
    }

    format!(
        "// This file is generated by `codegen` from `codegen/errcodes.txt`, do not edit.\n\
        //\n\
        // ```sh\n\
        // cargo run -p codegen\n\
        // ```\n\
        \n\
        sqlstate! {{\n    codes {{\n{codes}    }}\n    classes {{\n{classes}    }}\n}}\n"
    )
}

#[cfg(test)]
mod test {
    use super::*;

    const SOURCE: &str = "\
# comment
#

Section: Class 01 - Warning

01000    W    ERRCODE_WARNING                                warning

Section: Class 42 - Syntax Error or Access Rule Violation

42000    E    ERRCODE_SYNTAX_ERROR_OR_ACCESS_RULE_VIOLATION  syntax_error_or_access_rule_violation
42P01    E    ERRCODE_UNDEFINED_TABLE                        undefined_table

Section: Class 40 - Transaction Rollback

40P01    E    ERRCODE_T_R_DEADLOCK_DETECTED                  deadlock_detected
";

    #[test]
    fn parse_sections() {
        let errcodes = parse(SOURCE).unwrap();
        assert_eq!(errcodes.len(), 3);
        let (class, section) = errcodes.iter().last().unwrap();
        assert_eq!(class, "42");
        assert_eq!(section.title, "Class 42 - Syntax Error or Access Rule Violation");
        assert_eq!(section.codes.len(), 2);
        assert_eq!(section.codes[1].sqlstate, "42P01");
        assert_eq!(section.codes[1].status, 'E');
        assert_eq!(section.codes[1].spec_name.as_deref(), Some("undefined_table"));
    }

    #[test]
    fn parse_invalid() {
        assert!(parse("42P01 E ERRCODE_UNDEFINED_TABLE\n").is_err());
        assert!(parse("Section: Class 42 - Syntax\n42P1 E ERRCODE_X\n").is_err());
        assert!(parse("Section: Class 42 - Syntax\n42P01 X ERRCODE_X\n").is_err());
        assert!(parse("Section: 42\n").is_err());
    }

    #[test]
    fn render_table() {
        let source = render(&parse(SOURCE).unwrap());
        assert!(!source.contains("Warning"));
        assert!(source.contains("        /// `42P01` undefined_table\n        UndefinedTable = \"42P01\",\n"));
        assert!(source.contains("TRDeadlockDetected = \"40P01\","));
        assert!(source.contains("        \"42\" => SyntaxErrorOrAccessRuleViolation,\n"));
        // no generic subclass
        assert!(!source.contains("\"40\" =>"));
    }

    #[test]
    fn bundled_matches_generated() {
        let errcodes = parse(include_str!("../errcodes.txt")).unwrap();
        assert!(errcodes.values().flat_map(|s| &s.codes).any(|e| e.sqlstate == "22012"));
        assert_eq!(
            render(&errcodes),
            include_str!("../../pgresult/src/errcode/generated.rs"),
        );
    }
}
