use std::error::Error;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Defines the interface for writing a molecular file format.
///
/// Implementors render a fully resolved in-memory `Document` into the
/// fixed-grammar text of their format.
pub trait MolecularFile {
    /// The in-memory document this format serializes.
    type Document;

    /// The error type for I/O operations.
    type Error: Error + From<io::Error>;

    /// Writes a document to a writer.
    ///
    /// # Arguments
    ///
    /// * `document` - The document to write.
    /// * `writer` - The writer to output to.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be represented in this format
    /// or writing fails.
    fn write_to(document: &Self::Document, writer: &mut impl Write) -> Result<(), Self::Error>;

    /// Renders a document into an in-memory string.
    ///
    /// Nothing touches the filesystem, so callers can render several files
    /// before committing any of them.
    fn render(document: &Self::Document) -> Result<String, Self::Error> {
        let mut buffer = Vec::new();
        Self::write_to(document, &mut buffer)?;
        String::from_utf8(buffer)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e).into())
    }

    /// Writes a document to a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or writing fails.
    fn write_to_path<P: AsRef<Path>>(
        document: &Self::Document,
        path: P,
    ) -> Result<(), Self::Error> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        Self::write_to(document, &mut writer)?;
        writer.flush()?;
        Ok(())
    }
}

/// A molecular file format that can also be parsed back into its document.
pub trait ReadableFile: MolecularFile {
    /// Reads a document from a buffered reader.
    ///
    /// # Errors
    ///
    /// Returns an error if parsing fails or I/O operations encounter issues.
    fn read_from(reader: &mut impl BufRead) -> Result<Self::Document, Self::Error>;

    /// Reads a document from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or parsing fails.
    fn read_from_path<P: AsRef<Path>>(path: P) -> Result<Self::Document, Self::Error> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        Self::read_from(&mut reader)
    }
}
