//! Subcommand implementations. Each returns the text to print.

use std::fmt::{self, Write as _};
use std::path::Path;
use std::sync::Arc;

use clap::{Subcommand, ValueEnum};
use strata_materials::{Library, LoadError, MaterialError, MaterialNode, air, saline, water};
use strata_units::{UnitError, convert};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Material(#[from] MaterialError),
    #[error(transparent)]
    Unit(#[from] UnitError),
    #[error("failed to format output")]
    Format(#[from] fmt::Error),
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// List material categories and their base materials.
    Categories,

    /// Print a material's identity and properties.
    Show {
        /// Material key or dotted path, e.g. `stainless.s316L.passivated`.
        path: String,
    },

    /// Print the material hierarchy of one category, or of all of them.
    Tree { category: Option<String> },

    /// Build materials from a TOML file and print their hierarchy.
    Load { file: std::path::PathBuf },

    /// Print a computed fluid material.
    Fluid {
        #[arg(value_enum)]
        kind: FluidKind,
        /// Temperature in degC.
        #[arg(long, default_value_t = 20.0, allow_negative_numbers = true)]
        temperature: f64,
        /// Pressure in atm (air only).
        #[arg(long, default_value_t = 1.0)]
        pressure: f64,
        /// NaCl concentration in weight percent (saline only).
        #[arg(long, default_value_t = 0.9)]
        concentration: f64,
    },

    /// Convert a value between units of the same dimension.
    Convert {
        #[arg(allow_negative_numbers = true)]
        value: f64,
        from: String,
        to: String,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FluidKind {
    Water,
    Air,
    Saline,
}

impl Command {
    /// Runs the command against `library`.
    ///
    /// # Errors
    ///
    /// Load, lookup or unit conversion failures.
    pub fn run(&self, library: &Library<'_>) -> Result<String, CommandError> {
        match self {
            Command::Categories => Ok(categories()?),
            Command::Show { path } => Ok(library.get(path)?.info()),
            Command::Tree { category } => tree(library, category.as_deref()),
            Command::Load { file } => load(library, file),
            Command::Fluid {
                kind,
                temperature,
                pressure,
                concentration,
            } => {
                let node = match kind {
                    FluidKind::Water => water(*temperature)?,
                    FluidKind::Air => air(*temperature, *pressure)?,
                    FluidKind::Saline => saline(*concentration, *temperature)?,
                };
                Ok(node.info())
            }
            Command::Convert { value, from, to } => {
                let converted = convert(*value, from, to)?;
                Ok(format!("{value} {from} = {converted} {to}"))
            }
        }
    }
}

fn categories() -> Result<String, fmt::Error> {
    let mut out = String::new();
    for category in Library::categories() {
        let bases = strata_materials::CATEGORIES
            .iter()
            .find(|(name, _)| *name == category)
            .map(|(_, bases)| bases.join(", "))
            .unwrap_or_default();
        writeln!(out, "{category}: {bases}")?;
    }
    Ok(out)
}

fn tree(library: &Library<'_>, category: Option<&str>) -> Result<String, CommandError> {
    let names = match category {
        Some(name) => vec![library.category(name)?.name()],
        None => Library::categories(),
    };
    let mut out = String::new();
    for name in names {
        writeln!(out, "{name}")?;
        for root in library.category(name)?.materials()? {
            render_tree(&root, 1, &mut out)?;
        }
    }
    Ok(out)
}

fn load(library: &Library<'_>, file: &Path) -> Result<String, CommandError> {
    let roots = library.load_file(file)?;
    let mut out = String::new();
    for root in roots.values() {
        render_tree(root, 0, &mut out)?;
    }
    Ok(out)
}

/// Appends `node` and its subtree, one line per node, indented by depth.
///
/// # Errors
///
/// Only if `out` refuses the write.
pub fn render_tree(node: &Arc<MaterialNode>, depth: usize, out: &mut impl fmt::Write) -> fmt::Result {
    let density = node
        .density()
        .map(|d| format!("  ρ={d}"))
        .unwrap_or_default();
    writeln!(
        out,
        "{:indent$}{} ({}){density}",
        "",
        node.segment(),
        node.name(),
        indent = depth * 2
    )?;
    for child in node.children() {
        render_tree(&child, depth + 1, out)?;
    }
    Ok(())
}
