//! Recipe runner.
//!
//! A recipe is a TOML file with an ordered list of steps, each naming an
//! entry of the command table:
//!
//! ```toml
//! [[step]]
//! op = "job"
//! args = ["https://old.example/job/${name}", "https://new.example/job/${name}"]
//!
//! [[step]]
//! op = "echo"
//! args = ["cloned ${name}"]
//!
//! [[step]]
//! op = "update-view"
//! args = ["new", "all"]
//! local_library = "~/jenkins"
//!
//! [[step]]
//! op = "delete-job"
//! args = ["https://old.example/job/${name}"]
//! dry_run = true
//! ```
//!
//! Steps inherit `force` and `local_library` unless they set their own.
//! Dry-run only accumulates: a step may ask for `dry_run = true`, but a
//! recipe run in dry-run mode runs every step, nested recipes included, in
//! dry-run mode whatever the step says. `local_library` values go through
//! `~`/`$VAR` expansion. The recipe exits with the first
//! non-zero code of its steps. A recipe that cannot be read or parsed, or
//! references an undefined `${property}`, runs no step at all and exits with
//! [`FAILURE_CODE`].

use crate::dispatch::{Dispatcher, Invocation, Operation};
use crate::error::{Error, Result};
use crate::handler::TransferFlags;
use crate::response::{FAILURE_CODE, Response};
use regex::Regex;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Deepest allowed chain of recipes running recipes.
pub const MAX_DEPTH: usize = 16;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RecipeFile {
    #[serde(default)]
    step: Vec<RawStep>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawStep {
    op: String,
    #[serde(default)]
    args: Vec<String>,
    dry_run: Option<bool>,
    force: Option<bool>,
    local_library: Option<String>,
}

/// One evaluated recipe step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Invoke(Invocation),
    /// Line for the recipe's stdout
    Echo(String),
    /// Line for the recipe's stderr
    Warn(String),
}

/// A parsed recipe, ready to run.
#[derive(Debug, Clone)]
pub struct Recipe {
    path: PathBuf,
    steps: Vec<Step>,
}

impl Recipe {
    /// Read and evaluate the recipe at `path` in the context of `parent`.
    pub fn load(path: &Path, parent: &Invocation) -> Result<Self> {
        let source = fs::read_to_string(path).map_err(|e| Error::Recipe {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::parse(&source, path, parent)
    }

    /// Evaluate recipe `source` as if read from `path`.
    ///
    /// Relative `recipe` step arguments and `local_library` values are taken
    /// relative to the directory of `path`.
    pub fn parse(source: &str, path: &Path, parent: &Invocation) -> Result<Self> {
        let fail = |message: String| Error::Recipe {
            path: path.to_path_buf(),
            message,
        };

        let file: RecipeFile = toml::from_str(source).map_err(|e| fail(e.to_string()))?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));

        let mut steps = Vec::with_capacity(file.step.len());
        for (index, raw) in file.step.into_iter().enumerate() {
            let number = index + 1;
            let mut args = Vec::with_capacity(raw.args.len());
            for arg in &raw.args {
                args.push(
                    substitute(arg, &parent.properties)
                        .map_err(|name| fail(format!("step {number}: undefined property '{name}'")))?,
                );
            }

            let step = match raw.op.as_str() {
                "echo" => Step::Echo(args.join(" ")),
                "warn" => Step::Warn(args.join(" ")),
                name => {
                    let operation = Operation::from_name(name)
                        .ok_or_else(|| fail(format!("step {number}: unknown operation '{name}'")))?;

                    let local_library = match &raw.local_library {
                        Some(value) => {
                            let value = substitute(value, &parent.properties).map_err(|name| {
                                fail(format!("step {number}: undefined property '{name}'"))
                            })?;
                            Some(base.join(expand(&value)))
                        }
                        None => parent.flags.local_library.clone(),
                    };

                    if operation == Operation::Recipe {
                        for arg in &mut args {
                            *arg = base.join(&*arg).display().to_string();
                        }
                    }

                    Step::Invoke(Invocation {
                        operation,
                        args,
                        flags: TransferFlags {
                            force: raw.force.unwrap_or(parent.flags.force),
                            dry_run: parent.flags.dry_run || raw.dry_run.unwrap_or(false),
                            local_library,
                        },
                        properties: parent.properties.clone(),
                        depth: parent.depth + 1,
                    })
                }
            };
            steps.push(step);
        }

        Ok(Self {
            path: path.to_path_buf(),
            steps,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }
}

/// Expand `~` and environment variables; unknown variables stay as written.
fn expand(path: &str) -> PathBuf {
    let expanded = shellexpand::full(path).unwrap_or(std::borrow::Cow::Borrowed(path));
    PathBuf::from(expanded.as_ref())
}

/// Replace every `${name}` in `text`; `Err` carries the first undefined name.
fn substitute(
    text: &str,
    properties: &BTreeMap<String, String>,
) -> std::result::Result<String, String> {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    let placeholder =
        PLACEHOLDER.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("valid regex"));

    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for captures in placeholder.captures_iter(text) {
        let (Some(whole), Some(name)) = (captures.get(0), captures.get(1)) else {
            continue;
        };
        let value = properties
            .get(name.as_str().trim())
            .ok_or_else(|| name.as_str().trim().to_string())?;
        out.push_str(&text[last..whole.start()]);
        out.push_str(value);
        last = whole.end();
    }
    out.push_str(&text[last..]);

    Ok(out)
}

/// Runs recipes through a dispatcher.
pub struct RecipeRunner<'d> {
    dispatcher: &'d dyn Dispatcher,
}

impl<'d> RecipeRunner<'d> {
    pub fn new(dispatcher: &'d dyn Dispatcher) -> Self {
        Self { dispatcher }
    }

    /// Run the recipe named by the invocation's single argument.
    pub fn run(&self, invocation: &Invocation) -> Result<Response> {
        if invocation.args.len() != 1 {
            return Err(Error::InsufficientArguments {
                operation: Operation::Recipe.name().to_string(),
                expected: "exactly 1",
                actual: invocation.args.len(),
            });
        }
        if invocation.depth >= MAX_DEPTH {
            return Err(Error::RecipeDepth(MAX_DEPTH));
        }

        let path = Path::new(&invocation.args[0]);
        let mut response = Response::new();
        response.out(format!("Evaluating recipe {}", path.display()));
        log::info!("Evaluating recipe {}", path.display());

        let recipe = match Recipe::load(path, invocation) {
            Ok(recipe) => recipe,
            Err(e) => {
                log::error!("{}", e);
                response.err(e.to_string()).force_return_code(FAILURE_CODE);
                return Ok(response);
            }
        };

        for step in recipe.steps() {
            match step {
                Step::Echo(line) => {
                    response.out(line);
                }
                Step::Warn(line) => {
                    response.err(line);
                }
                Step::Invoke(sub) => match self.dispatcher.dispatch(sub) {
                    Ok(result) => {
                        response.merge(result);
                    }
                    Err(e) => {
                        log::warn!("{} failed: {}", sub.operation, e);
                        response.merge(Response::failure(
                            FAILURE_CODE,
                            format!("{}: {e}", sub.operation),
                        ));
                    }
                },
            }
        }

        Ok(response)
    }
}

// ============================================================================
// Tests
// ============================================================================
