//! Render resolver output as text.

use itertools::Itertools;
use line_index::{LineIndex, TextSize};
use serde::{Deserialize, Serialize};
use std::fmt;
use strata_driver::{
    ir::{Block, Identifier, Instruction, Symbol, Value, VariableId},
    syntax::Span,
    typecheck::{Diagnostic, Info},
    util::WithInfo,
    Checked,
};

#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    pub line: u32,
    pub column: u32,
    pub index: u32,
}

#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedSourceLocation {
    pub visible_path: String,
    pub start: SourceLocation,
    pub end: SourceLocation,
}

/// A diagnostic ready to be shown to the user.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedDiagnostic {
    pub location: Option<RenderedSourceLocation>,
    pub function: String,
    pub message: String,
}

impl fmt::Display for RenderedDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.function, self.message)
    }
}

/// Renders locations and diagnostics for one listing.
#[derive(Debug)]
pub struct Render {
    visible_path: String,
    code: String,
    line_index: LineIndex,
}

impl Render {
    /// Prepare to render diagnostics for `code`.
    pub fn new(visible_path: impl Into<String>, code: impl Into<String>) -> Self {
        let code = code.into();

        Render {
            visible_path: visible_path.into(),
            line_index: LineIndex::new(&code),
            code,
        }
    }

    /// Convert byte offsets into zero-based lines and columns.
    pub fn render_source_location(&self, span: Span) -> Option<RenderedSourceLocation> {
        let location = |offset: usize| {
            let index = u32::try_from(offset).ok()?;
            let line_col = self.line_index.try_line_col(TextSize::new(index))?;

            Some(SourceLocation {
                line: line_col.line,
                column: line_col.col,
                index,
            })
        };

        Some(RenderedSourceLocation {
            visible_path: self.visible_path.clone(),
            start: location(span.start)?,
            end: location(span.end)?,
        })
    }

    /// The source text a span covers.
    pub fn render_code(&self, span: Span) -> Option<&str> {
        self.code.get(span)
    }

    /// Attach a message and, when known, a location to a diagnostic.
    pub fn render_diagnostic(
        &self,
        checked: &Checked,
        diagnostic: &WithInfo<Info, Diagnostic>,
    ) -> RenderedDiagnostic {
        RenderedDiagnostic {
            location: checked
                .span(&diagnostic.info)
                .and_then(|span| self.render_source_location(span)),
            function: diagnostic.info.function.clone(),
            message: render_message(&diagnostic.item),
        }
    }

    /// `path:line:column: error: message`, with one-based lines and columns.
    pub fn render_diagnostic_to_debug_string(&self, diagnostic: &RenderedDiagnostic) -> String {
        match &diagnostic.location {
            Some(location) => format!(
                "{}:{}:{}: error: {}",
                location.visible_path,
                location.start.line + 1,
                location.start.column + 1,
                diagnostic.message
            ),
            None => format!(
                "{}: error: in {}: {}",
                self.visible_path, diagnostic.function, diagnostic.message
            ),
        }
    }

    /// Render an error that prevented the listing from being checked.
    pub fn render_error(&self, error: &strata_driver::Error) -> String {
        let location = error
            .offset()
            .and_then(|offset| self.render_source_location(offset..offset));

        match location {
            Some(location) => format!(
                "{}:{}:{}: error: {}",
                location.visible_path,
                location.start.line + 1,
                location.start.column + 1,
                error
            ),
            None => format!("{}: error: {}", self.visible_path, error),
        }
    }
}

/// The message describing a diagnostic.
pub fn render_message(diagnostic: &Diagnostic) -> String {
    match diagnostic {
        Diagnostic::UndefinedFunction {
            module,
            function,
            arguments,
        } => format!(
            "'{module}.{function}' undefined in: {module}.{function}({})",
            arguments.iter().join(", ")
        ),
        Diagnostic::ConstantAssignment(name) => {
            format!("assignment to constant '{name}'")
        }
        Diagnostic::MultipleAssignmentMismatch { returns, sources } => format!(
            "multiple assignment mismatch: {returns} destinations, {sources} sources"
        ),
        Diagnostic::TypeMismatch {
            destination,
            source,
        } => format!("type mismatch {destination} := {source}"),
        Diagnostic::MissingImplementation { module, function } => {
            format!("'{module}.{function}' has no address")
        }
        Diagnostic::ErroneousFunction { module, function } => {
            format!("'{module}.{function}' contains errors")
        }
        Diagnostic::RecursiveSpecialization { module, function } => {
            format!("recursive specialization of '{module}.{function}'")
        }
    }
}

/// One instruction as it would appear in a listing, with the types of its
/// destinations.
pub fn render_instruction(block: &Block, instruction: &Instruction) -> String {
    let mut rendered = String::new();

    if let Some(barrier) = instruction.barrier {
        rendered.push_str(&format!("{barrier} "));
    }

    let returns = instruction
        .returns()
        .iter()
        .map(|&destination| {
            let variable = block.variable(destination);
            format!("{}:{}", variable.name, variable.r#type)
        })
        .collect::<Vec<_>>();

    match returns.as_slice() {
        [] => {}
        [destination] => rendered.push_str(destination),
        destinations => rendered.push_str(&format!("({})", destinations.join(", "))),
    }

    let sources = instruction
        .sources()
        .iter()
        .map(|&source| render_operand(block, source))
        .collect::<Vec<_>>();

    if instruction.is_call() {
        let callee = |identifier: &Option<Identifier>| match identifier {
            Some(Identifier::Name(name)) => name.to_string(),
            Some(Identifier::Variable(variable)) => format!("${}", block.variable(*variable).name),
            None => String::from("?"),
        };

        if !returns.is_empty() {
            rendered.push_str(" := ");
        }

        rendered.push_str(&format!(
            "{}.{}({})",
            callee(&instruction.module),
            callee(&instruction.function),
            sources.join(", ")
        ));
    } else {
        match sources.as_slice() {
            [] => {}
            [source] => rendered.push_str(&format!(" := {source}")),
            sources => rendered.push_str(&format!(" := ({})", sources.join(", "))),
        }
    }

    rendered.push(';');
    rendered
}

fn render_operand(block: &Block, id: VariableId) -> String {
    let variable = block.variable(id);

    match &variable.value {
        Some(Value::Nil) if !variable.r#type.is_void() => format!("nil:{}", variable.r#type),
        Some(value) => value.to_string(),
        None => variable.name.clone(),
    }
}

/// A symbol's signature and, for functions, its body.
pub fn render_symbol(symbol: &Symbol) -> String {
    let mut rendered = symbol.signature.to_string();

    if let Some(entry) = &symbol.signature.entry {
        rendered.push_str(&format!(" address {entry}"));
    }

    rendered.push(';');

    if let Some(body) = &symbol.body {
        let body = body.lock();

        for instruction in &body.instructions {
            rendered.push_str("\n    ");
            rendered.push_str(&render_instruction(&body, instruction));
        }

        rendered.push_str(&format!("\nend {};", symbol.signature.name));
    }

    rendered
}
