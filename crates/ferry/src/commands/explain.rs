//! Explain command - long-form help for diagnostic codes

use anyhow::{anyhow, Result};
use clap::Args;
use ferry_diagnostics::DiagnosticCode;

use super::Ui;
use crate::OutputFormat;

#[derive(Args, Debug)]
pub struct ExplainArgs {
    /// Diagnostic code to explain (e.g., U003, C001)
    pub code: String,
}

struct Explanation {
    code: DiagnosticCode,
    title: &'static str,
    description: &'static str,
    example: Option<&'static str>,
    suggestion: Option<&'static str>,
    related: &'static [&'static str],
}

const EXPLANATIONS: &[Explanation] = &[
    Explanation {
        code: DiagnosticCode::ParseError,
        title: "Parse Error",
        description: "The TypeScript parser rejected the file. A unit that does not parse is skipped entirely and no module is written for it.",
        example: Some("let x: number = ;  // missing value"),
        suggestion: Some("Fix the syntax error; the file must compile with tsc first."),
        related: &[],
    },
    Explanation {
        code: DiagnosticCode::UnsupportedSyntax,
        title: "Unsupported Syntax",
        description: r#"A statement or expression has no Haxe counterpart.

The construct is copied into the output inside a block comment so the rest of
the module still compiles, and the transpile continues."#,
        example: Some("const v = o?.f();  // optional call\nconst s = (a, b);  // comma operator"),
        suggestion: Some("Rewrite the construct with plain calls, conditionals or temporaries."),
        related: &["U005", "U007"],
    },
    Explanation {
        code: DiagnosticCode::UnsupportedType,
        title: "Unsupported Type",
        description: r#"A type expression cannot be expressed in Haxe's type system.

The type is emitted as `Dynamic` followed by the original text in a comment, so
the declaration keeps compiling but loses static checking."#,
        example: Some("type Keys = keyof User;\ntype Pick2<T> = T extends string ? A : B;"),
        suggestion: Some("Spell the resulting type out explicitly, or accept Dynamic."),
        related: &["C001"],
    },
    Explanation {
        code: DiagnosticCode::UnsupportedImport,
        title: "Unsupported Import",
        description: "Namespace imports, side-effect imports, `import x = require(..)` and dynamic `import()` have no Haxe import form.",
        example: Some("import * as fs from \"fs\";\nimport \"./polyfill\";"),
        suggestion: Some("Import the individual names you use with a named import."),
        related: &["R001", "U004"],
    },
    Explanation {
        code: DiagnosticCode::UnsupportedExport,
        title: "Unsupported Export",
        description: r#"Haxe module fields are visible by name, so a plain `export` is simply dropped.
Forms that create new bindings at export time cannot be expressed: `export *`,
re-exports from another module, `export =` and `export default <expression>`."#,
        example: Some("export * from \"./a\";\nexport default 42;"),
        suggestion: Some("Import from the declaring module directly, or export a named declaration."),
        related: &["U003"],
    },
    Explanation {
        code: DiagnosticCode::UnsupportedPattern,
        title: "Unsupported Pattern",
        description: "A destructuring pattern appears where it cannot be lowered into flat declarations, such as the left side of a plain assignment.",
        example: Some("[a, b] = [b, a];"),
        suggestion: Some("Assign through a temporary and index it explicitly."),
        related: &["U001"],
    },
    Explanation {
        code: DiagnosticCode::UnsupportedMember,
        title: "Unsupported Member",
        description: "A class, interface or object literal member has no Haxe equivalent: computed keys, private `#names`, index signatures, static blocks and accessors in object literals.",
        example: Some("class A { #secret = 1; [key: string]: unknown; }"),
        suggestion: Some("Use a regular private field or a haxe.DynamicAccess map."),
        related: &["U001"],
    },
    Explanation {
        code: DiagnosticCode::UnsupportedControlFlow,
        title: "Unsupported Control Flow",
        description: r#"A control-flow construct does not map onto Haxe statements without changing
its meaning: labels, `finally`, `for await`, `switch` fallthrough from a
non-empty case, `break` inside a `switch` case, and `continue` in a C-style
`for` loop that is lowered to `while` (the update would be skipped)."#,
        example: Some("for (let i = 0; i < n; i += 2) { if (skip(i)) continue; }"),
        suggestion: Some("Restructure the loop or switch so every path ends without the construct."),
        related: &["U001"],
    },
    Explanation {
        code: DiagnosticCode::WideUnion,
        title: "Union Wider Than The Either Limit",
        description: r#"Unions and tuples fold into nested `haxe.extern.EitherType<A, B>` wrappers.
Past the configured either arity limit the nesting is no longer useful and the
type becomes `Dynamic` instead."#,
        example: Some("type Id = string | number | boolean | Date | RegExp;"),
        suggestion: Some("Raise `either_arity_limit` in ferry.toml, or narrow the union."),
        related: &["U002"],
    },
    Explanation {
        code: DiagnosticCode::UnresolvedImport,
        title: "Unresolved Import",
        description: "An imported name does not resolve to a declaration in a project file. Package imports are not followed; the import is commented out.",
        example: Some("import { h } from \"preact\";"),
        suggestion: Some("Provide a Haxe extern for the package and import it by hand."),
        related: &["U003"],
    },
    Explanation {
        code: DiagnosticCode::InternalError,
        title: "Internal Transform Error",
        description: r#"A rewrite rule met a tree shape it does not expect.

Normally this fails the unit and no module is written. With `--degrade` (or
`degrade_on_error = true`) the node is emitted as a comment instead and this
code is reported."#,
        example: None,
        suggestion: Some("Report the input that triggered it; use --degrade to keep going."),
        related: &[],
    },
];

fn lookup(code: &str) -> Option<&'static Explanation> {
    let code = DiagnosticCode::parse(code)?;
    EXPLANATIONS.iter().find(|e| e.code == code)
}

pub fn run(args: ExplainArgs, ui: Ui) -> Result<()> {
    let explanation =
        lookup(&args.code).ok_or_else(|| anyhow!("Unknown diagnostic code: {}", args.code))?;
    let code = explanation.code.as_str();

    match ui.format {
        OutputFormat::Text => {
            let underline = "=".repeat(code.len() + explanation.title.len() + 2);
            if ui.use_color {
                println!(
                    "\n{}: {}\n{}",
                    console::style(code).bold().cyan(),
                    console::style(explanation.title).bold(),
                    underline
                );
            } else {
                println!("\n{}: {}\n{}", code, explanation.title, underline);
            }

            println!("\n{}\n", explanation.description);

            let sections = [("Example", explanation.example), ("Suggestion", explanation.suggestion)];
            for (heading, body) in sections {
                let Some(body) = body else { continue };
                if ui.use_color {
                    println!("{}:", console::style(heading).bold());
                } else {
                    println!("{heading}:");
                }
                for line in body.lines() {
                    println!("  {line}");
                }
                println!();
            }

            if !explanation.related.is_empty() {
                if ui.use_color {
                    println!("{}: {}", console::style("Related").dim(), explanation.related.join(", "));
                } else {
                    println!("Related: {}", explanation.related.join(", "));
                }
            }
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "code": code,
                "title": explanation.title,
                "severity": explanation.code.default_severity().to_string(),
                "description": explanation.description,
                "example": explanation.example,
                "suggestion": explanation.suggestion,
                "related": explanation.related,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_code_is_explained() {
        for code in DiagnosticCode::ALL {
            assert!(lookup(code.as_str()).is_some(), "{code} has no explanation");
        }
        assert_eq!(EXPLANATIONS.len(), DiagnosticCode::ALL.len());
    }

    #[test]
    fn test_related_codes_exist() {
        for explanation in EXPLANATIONS {
            for related in explanation.related {
                assert!(DiagnosticCode::parse(related).is_some(), "{related}");
            }
        }
    }

    #[test]
    fn test_lookup_ignores_case() {
        assert_eq!(lookup("u007").map(|e| e.title), Some("Unsupported Control Flow"));
        assert!(lookup("X999").is_none());
    }
}
