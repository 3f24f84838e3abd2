//! `usda` implements text file parser.

use std::{fs, path::Path};

use anyhow::{Context, Result};

pub mod parser;
pub mod syntax;
pub mod token;

use parser::Parser;

use crate::{project, scene::Document};

/// Parses usda text and projects it to a [Document].
pub fn parse(data: &str) -> Result<Document> {
    let mut parser = Parser::new(data)?;
    let root = parser.parse()?;

    project::project(&root)
}

/// Reads and parses a usda file.
pub fn read(path: impl AsRef<Path>) -> Result<Document> {
    let path = path.as_ref();
    let data = fs::read_to_string(path).with_context(|| format!("Unable to read file: {}", path.display()))?;

    parse(&data).context("Unable to parse text file")
}
