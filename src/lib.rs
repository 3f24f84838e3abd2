//! `usd2json` converts USDA scene description text into canonical JSON.
//!
//! The pipeline runs strictly in order: tokenizer, parser, projector and
//! serializer. Any lexing or grammar error aborts the whole conversion.

use std::{fs, path::Path};

use anyhow::{Context, Result};

pub mod error;
pub mod json;
pub mod project;
pub mod scene;
pub mod usda;

pub use error::{LexError, Position, SerializationError, SyntaxError};
pub use json::Options;
pub use scene::{Document, Object, Specifier, Value};
pub use usda::parse;

/// Converts usda text to JSON text.
///
/// Construct once and reuse for any number of inputs.
pub struct Converter {
    serializer: json::Serializer,
}

impl Converter {
    pub fn new(options: Options) -> Result<Self> {
        let serializer = json::Serializer::new(options)?;
        Ok(Self { serializer })
    }

    #[inline]
    pub fn options(&self) -> &Options {
        self.serializer.options()
    }

    pub fn convert(&self, data: &str) -> Result<String> {
        let document = usda::parse(data)?;
        self.serializer.serialize(&document)
    }

    /// Converts `input` and writes the result to `output`.
    ///
    /// The output file is only created once the whole conversion succeeded.
    pub fn convert_file(&self, input: impl AsRef<Path>, output: impl AsRef<Path>) -> Result<()> {
        let (input, output) = (input.as_ref(), output.as_ref());

        let data = fs::read_to_string(input).with_context(|| format!("Unable to read file: {}", input.display()))?;

        let mut text = self
            .convert(&data)
            .with_context(|| format!("Unable to convert {}", input.display()))?;
        text.push('\n');

        fs::write(output, text).with_context(|| format!("Unable to write file: {}", output.display()))?;

        log::debug!("Converted {} to {}", input.display(), output.display());

        Ok(())
    }
}
