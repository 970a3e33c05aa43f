//! Parser for Go module files (go.mod)
//!
//! Parsing happens in two stages: the text is first turned into a
//! [`FileSyntax`] tree of lines, blocks and comments, and the tree is then
//! interpreted directive by directive into a [`ModFile`]. Lexical and
//! block-structure errors abort the first stage; directive errors are
//! collected so a single parse reports every bad line.

mod error;
mod lexer;
mod syntax;
pub mod version;

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

pub use error::{ErrorKind, ParseError, ParseErrors, Position};
pub use syntax::{Comment, CommentBlock, Comments, FileSyntax, Line, LineBlock, Stmt};

use syntax::parse_string;

static GO_VERSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([1-9][0-9]*)\.(0|[1-9][0-9]*)(\.(0|[1-9][0-9]*))?([a-z]+[0-9]+)?$")
        .expect("valid go version regex")
});

static LAX_GO_VERSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^v?(([1-9][0-9]*)\.(0|[1-9][0-9]*))([^0-9].*)$")
        .expect("valid lax go version regex")
});

static TOOLCHAIN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^default$|^go1($|\.)").expect("valid toolchain regex"));

static DEPRECATED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)(?:^|\n\n)Deprecated: *(.*?)(?:$|\n\n)").expect("valid deprecation regex")
});

/// How strictly directives are checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParseMode {
    /// Main-module rules: every directive is checked, unknown ones are errors
    #[default]
    Strict,
    /// Dependency rules: only `module`, `go`, `require` and `retract` are
    /// interpreted; everything else is skipped
    Lax,
}

/// Options controlling a parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParseOptions {
    pub mode: ParseMode,
    /// Require the major version of `require`, `exclude` and `replace`
    /// versions to agree with the module path's `/vN` suffix
    pub check_path_major: bool,
}

impl ParseOptions {
    pub fn lax() -> Self {
        Self {
            mode: ParseMode::Lax,
            ..Self::default()
        }
    }

    fn strict(&self) -> bool {
        self.mode == ParseMode::Strict
    }
}

/// A module path and version pair.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleVersion {
    pub path: String,
    pub version: String,
}

/// The `module` directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    pub module: ModuleVersion,
    /// Text of the `Deprecated:` paragraph in the directive's comments
    pub deprecated: String,
    pub position: Position,
}

/// The `go` directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoDirective {
    pub version: String,
    pub position: Position,
}

/// The `toolchain` directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
    pub name: String,
    pub position: Position,
}

/// A `godebug key=value` setting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Godebug {
    pub key: String,
    pub value: String,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Require {
    pub module: ModuleVersion,
    /// Marked with an `// indirect` comment
    pub indirect: bool,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exclude {
    pub module: ModuleVersion,
    pub position: Position,
}

/// A `replace` directive. `old.version` is empty when every version is
/// replaced; `new.version` is empty for directory replacements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replace {
    pub old: ModuleVersion,
    pub new: ModuleVersion,
    pub position: Position,
}

/// An inclusive version range. A single retracted version has `low == high`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionInterval {
    pub low: String,
    pub high: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Retract {
    pub interval: VersionInterval,
    pub rationale: String,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tool {
    pub path: String,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ignore {
    pub path: String,
    pub position: Position,
}

/// A parsed go.mod file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModFile {
    pub module: Option<Module>,
    pub go: Option<GoDirective>,
    pub toolchain: Option<Toolchain>,
    pub godebug: Vec<Godebug>,
    pub require: Vec<Require>,
    pub exclude: Vec<Exclude>,
    pub replace: Vec<Replace>,
    pub retract: Vec<Retract>,
    pub tool: Vec<Tool>,
    pub ignore: Vec<Ignore>,
    pub syntax: FileSyntax,
}

/// Parses a main-module go.mod file with strict checking.
pub fn parse(text: &str) -> Result<ModFile, ParseErrors> {
    parse_with(text, ParseOptions::default())
}

/// Parses a dependency's go.mod file, ignoring directives that only matter
/// to the main module.
pub fn parse_lax(text: &str) -> Result<ModFile, ParseErrors> {
    parse_with(text, ParseOptions::lax())
}

pub fn parse_with(text: &str, options: ParseOptions) -> Result<ModFile, ParseErrors> {
    let syntax = syntax::parse_syntax(text)?;

    let mut builder = Builder {
        file: ModFile::default(),
        errors: Vec::new(),
        options,
    };

    for stmt in &syntax.stmts {
        match stmt {
            Stmt::Line(line) => {
                if let Some((verb, args)) = line.tokens.split_first() {
                    builder.add(None, line, verb, args);
                }
            }
            Stmt::Block(block) => builder.add_block(block),
            Stmt::Comments(_) => {}
        }
    }

    if let Some(errors) = ParseErrors::from_vec(builder.errors) {
        return Err(errors);
    }

    let mut file = builder.file;
    file.syntax = syntax;
    Ok(file)
}

struct Builder {
    file: ModFile,
    errors: Vec<ParseError>,
    options: ParseOptions,
}

impl Builder {
    fn add_block(&mut self, block: &LineBlock) {
        let verb = match block.tokens.as_slice() {
            [verb] => verb.as_str(),
            tokens => {
                if self.options.strict() {
                    self.errors.push(ParseError::new(
                        block.start,
                        ErrorKind::UnknownBlockType(tokens.join(" ")),
                    ));
                }
                return;
            }
        };

        match verb {
            "module" | "godebug" | "require" | "exclude" | "replace" | "retract" | "tool"
            | "ignore" => {
                for line in &block.lines {
                    self.add(Some(block), line, verb, &line.tokens);
                }
            }
            _ => {
                if self.options.strict() {
                    self.errors.push(ParseError::new(
                        block.start,
                        ErrorKind::UnknownBlockType(verb.to_string()),
                    ));
                }
            }
        }
    }

    fn add(&mut self, block: Option<&LineBlock>, line: &Line, verb: &str, args: &[String]) {
        if !self.options.strict() && !matches!(verb, "go" | "module" | "retract" | "require") {
            tracing::trace!(verb, line = line.start.line, "skipping directive in lax mode");
            return;
        }

        let result = match verb {
            "module" => self.add_module(block, line, args),
            "go" => self.add_go(line, args),
            "toolchain" => self.add_toolchain(line, args),
            "godebug" => self.add_godebug(line, args),
            "require" | "exclude" => self.add_require_or_exclude(line, verb, args),
            "replace" => self.add_replace(line, args),
            "retract" => self.add_retract(block, line, args),
            "tool" => single_path_arg("tool", args).map(|path| {
                self.file.tool.push(Tool {
                    path,
                    position: line.start,
                });
            }),
            "ignore" => single_path_arg("ignore", args).map(|path| {
                self.file.ignore.push(Ignore {
                    path,
                    position: line.start,
                });
            }),
            _ => Err(ErrorKind::UnknownDirective(verb.to_string())),
        };

        if let Err(kind) = result {
            self.errors.push(ParseError::new(line.start, kind));
        }
    }

    fn add_module(
        &mut self,
        block: Option<&LineBlock>,
        line: &Line,
        args: &[String],
    ) -> Result<(), ErrorKind> {
        if self.file.module.is_some() {
            return Err(ErrorKind::Repeated("module"));
        }
        let [arg] = args else {
            return Err(ErrorKind::Usage("module module/path".to_string()));
        };
        let path = parse_string(arg)?;

        self.file.module = Some(Module {
            module: ModuleVersion {
                path,
                version: String::new(),
            },
            deprecated: parse_deprecation(block, line),
            position: line.start,
        });
        Ok(())
    }

    fn add_go(&mut self, line: &Line, args: &[String]) -> Result<(), ErrorKind> {
        if self.file.go.is_some() {
            return Err(ErrorKind::Repeated("go"));
        }
        let [arg] = args else {
            return Err(ErrorKind::ExpectsOneArgument("go"));
        };

        let version = if GO_VERSION_RE.is_match(arg) {
            arg.clone()
        } else if !self.options.strict()
            && let Some(captures) = LAX_GO_VERSION_RE.captures(arg)
        {
            captures[1].to_string()
        } else {
            return Err(ErrorKind::InvalidGoVersion(arg.clone()));
        };

        self.file.go = Some(GoDirective {
            version,
            position: line.start,
        });
        Ok(())
    }

    fn add_toolchain(&mut self, line: &Line, args: &[String]) -> Result<(), ErrorKind> {
        if self.file.toolchain.is_some() {
            return Err(ErrorKind::Repeated("toolchain"));
        }
        let [arg] = args else {
            return Err(ErrorKind::ExpectsOneArgument("toolchain"));
        };
        if !TOOLCHAIN_RE.is_match(arg) {
            return Err(ErrorKind::InvalidToolchain(arg.clone()));
        }

        self.file.toolchain = Some(Toolchain {
            name: arg.clone(),
            position: line.start,
        });
        Ok(())
    }

    fn add_godebug(&mut self, line: &Line, args: &[String]) -> Result<(), ErrorKind> {
        let usage = || ErrorKind::Usage("godebug key=value".to_string());
        let [arg] = args else {
            return Err(usage());
        };
        if arg.contains(['"', '`', '\'', ',']) {
            return Err(usage());
        }
        let (key, value) = arg.split_once('=').ok_or_else(usage)?;

        self.file.godebug.push(Godebug {
            key: key.to_string(),
            value: value.to_string(),
            position: line.start,
        });
        Ok(())
    }

    fn add_require_or_exclude(
        &mut self,
        line: &Line,
        verb: &str,
        args: &[String],
    ) -> Result<(), ErrorKind> {
        let [path_arg, version_arg] = args else {
            return Err(ErrorKind::Usage(format!("{verb} module/path v1.2.3")));
        };
        let path = parse_string(path_arg)?;
        let version = parse_version(verb, &path, version_arg)?;
        self.check_module_major(&path, &version)?;

        let module = ModuleVersion { path, version };
        if verb == "require" {
            self.file.require.push(Require {
                module,
                indirect: is_indirect(line),
                position: line.start,
            });
        } else {
            self.file.exclude.push(Exclude {
                module,
                position: line.start,
            });
        }
        Ok(())
    }

    fn check_module_major(&self, path: &str, version: &str) -> Result<(), ErrorKind> {
        let path_major = module_path_major(path)?;
        if !self.options.check_path_major {
            return Ok(());
        }
        version::check_path_major(version, path_major).map_err(|reason| {
            ErrorKind::PathMajorMismatch {
                path: path.to_string(),
                version: version.to_string(),
                reason,
            }
        })
    }

        fn add_replace(&mut self, line: &Line, args: &[String]) -> Result<(), ErrorKind> {
        let arrow = if args.get(1).is_some_and(|a| a == "=>") { 1 } else { 2 };
        if args.len() < arrow + 2 || args.len() > arrow + 3 || args[arrow] != "=>" {
            return Err(ErrorKind::Usage(
                "replace module/path [v1.2.3] => other/module v1.4\n\t or replace module/path [v1.2.3] => ../local/directory"
                    .to_string(),
            ));
        }

        let old_path = parse_string(&args[0])?;
        let mut old_version = String::new();
        if arrow == 2 {
            old_version = parse_version("replace", &old_path, &args[1])?;
            self.check_module_major(&old_path, &old_version)?;
        } else {
            module_path_major(&old_path)?;
        }

        let new_path = parse_string(&args[arrow + 1])?;
        let mut new_version = String::new();
        if args.len() == arrow + 2 {
            if !version::is_directory_path(&new_path) {
                let message = if new_path.contains('@') {
                    "replacement module must match format 'path version', not 'path@version'"
                } else {
                    "replacement module without version must be directory path (rooted or starting with . or ..)"
                };
                return Err(ErrorKind::Replacement(message.to_string()));
            }
            if std::path::MAIN_SEPARATOR == '/' && new_path.contains('\\') {
                return Err(ErrorKind::Replacement(
                    "replacement directory appears to be Windows path (on a non-windows system)"
                        .to_string(),
                ));
            }
        } else {
            new_version = parse_version("replace", &new_path, &args[arrow + 2])?;
            if version::is_directory_path(&new_path) {
                return Err(ErrorKind::Replacement(format!(
                    "replacement module directory path {new_path:?} cannot have version"
                )));
            }
        }

        self.file.replace.push(Replace {
            old: ModuleVersion {
                path: old_path,
                version: old_version,
            },
            new: ModuleVersion {
                path: new_path,
                version: new_version,
            },
            position: line.start,
        });
        Ok(())
    }

    fn add_retract(
        &mut self,
        block: Option<&LineBlock>,
        line: &Line,
        args: &[String],
    ) -> Result<(), ErrorKind> {
        let rationale = parse_directive_comment(block, line);
        let (interval, rest) = match parse_version_interval(args) {
            Ok(parsed) => parsed,
            Err(_) if !self.options.strict() => return Ok(()),
            Err(err) => return Err(err),
        };
        if let Some(extra) = rest.first()
            && self.options.strict()
        {
            return Err(ErrorKind::UnexpectedAfterVersion(extra.clone()));
        }

        self.file.retract.push(Retract {
            interval,
            rationale,
            position: line.start,
        });
        Ok(())
    }
}

fn single_path_arg(verb: &'static str, args: &[String]) -> Result<String, ErrorKind> {
    match args {
        [arg] => parse_string(arg),
        _ => Err(ErrorKind::ExpectsOneArgument(verb)),
    }
}

fn parse_version(verb: &str, path: &str, arg: &str) -> Result<String, ErrorKind> {
    let invalid = |version: String| ErrorKind::InvalidVersion {
        verb: verb.to_string(),
        path: path.to_string(),
        version,
    };
    let raw = parse_string(arg).map_err(|_| invalid(arg.to_string()))?;
    version::canonical_version(&raw).ok_or_else(|| invalid(raw))
}

/// Major-version suffix of a module path; malformed suffixes such as `/v1`
/// or a gopkg.in path without `.vN` are rejected.
fn module_path_major(path: &str) -> Result<&str, ErrorKind> {
    version::split_path_version(path)
        .map(|(_, path_major)| path_major)
        .ok_or_else(|| ErrorKind::InvalidModulePath(path.to_string()))
}

fn parse_version_interval(args: &[String]) -> Result<(VersionInterval, &[String]), ErrorKind> {
    fn version(arg: &str) -> Result<String, ErrorKind> {
        parse_version("retract", "", arg)
    }

    match args {
        [] => Err(ErrorKind::VersionInterval("expected '[' or version")),
        [first, ..] if first == "(" => Err(ErrorKind::VersionInterval("expected '[' or version")),
        [first, rest @ ..] if first != "[" => {
            let v = version(first)?;
            Ok((
                VersionInterval {
                    low: v.clone(),
                    high: v,
                },
                rest,
            ))
        }
        [_, rest @ ..] => {
            let [low, rest @ ..] = rest else {
                return Err(ErrorKind::VersionInterval("expected version after '['"));
            };
            let low = version(low)?;
            let [comma, rest @ ..] = rest else {
                return Err(ErrorKind::VersionInterval("expected ',' after version"));
            };
            if comma != "," {
                return Err(ErrorKind::VersionInterval("expected ',' after version"));
            }
            let [high, rest @ ..] = rest else {
                return Err(ErrorKind::VersionInterval("expected version after ','"));
            };
            let high = version(high)?;
            match rest {
                [close, rest @ ..] if close == "]" => Ok((VersionInterval { low, high }, rest)),
                _ => Err(ErrorKind::VersionInterval("expected ']' after version")),
            }
        }
    }
}

/// Collects the comment text attached to a directive. Lines inside a block
/// without comments of their own inherit the block's comments.
fn parse_directive_comment(block: Option<&LineBlock>, line: &Line) -> String {
    let comments = match block {
        Some(block) if line.comments.before.is_empty() && line.comments.suffix.is_empty() => {
            &block.comments
        }
        _ => &line.comments,
    };

    comments
        .before
        .iter()
        .chain(&comments.suffix)
        .filter_map(Comment::text)
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n")
}

fn parse_deprecation(block: Option<&LineBlock>, line: &Line) -> String {
    let text = parse_directive_comment(block, line);
    DEPRECATED_RE
        .captures(&text)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

fn is_indirect(line: &Line) -> bool {
    let Some(text) = line.comments.suffix.first().and_then(Comment::text) else {
        return false;
    };
    let fields: Vec<&str> = text.split_whitespace().collect();
    matches!(fields.as_slice(), ["indirect"] | ["indirect;", _, ..])
}
