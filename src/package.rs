//! Access to the three parts of a Word package that carry comment data.
//!
//! The extraction core only ever sees raw byte buffers. How those buffers are
//! obtained is the business of a [`PartSource`]: [`DocxPackage`] reads them from
//! a `.docx` archive, [`CommentParts`] holds them in memory.

use crate::error::{Error, Result};
use std::fmt;
use std::io::{Cursor, Read, Seek};
use std::path::Path;
use tracing::debug;

/// The parts of a Word package the report is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PartKind {
    /// `word/comments.xml`: comment bodies and authorship
    Comments,
    /// `word/commentsExtended.xml`: reply links and resolution state
    CommentsExtended,
    /// `word/document.xml`: the body carrying the anchor range markers
    Document,
}

impl PartKind {
    /// All required parts, in the order they are loaded.
    pub const ALL: [PartKind; 3] = [
        PartKind::Comments,
        PartKind::CommentsExtended,
        PartKind::Document,
    ];

    /// The part name inside the package.
    #[inline]
    pub const fn part_name(self) -> &'static str {
        match self {
            PartKind::Comments => "word/comments.xml",
            PartKind::CommentsExtended => "word/commentsExtended.xml",
            PartKind::Document => "word/document.xml",
        }
    }

    /// The bare file name of the part, used when dumping parts to disk.
    #[inline]
    pub const fn file_name(self) -> &'static str {
        match self {
            PartKind::Comments => "comments.xml",
            PartKind::CommentsExtended => "commentsExtended.xml",
            PartKind::Document => "document.xml",
        }
    }
}

impl fmt::Display for PartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.part_name())
    }
}

/// A source of raw part buffers.
///
/// Returns `Ok(None)` when the part does not exist; errors are reserved for a
/// container that cannot be read at all.
pub trait PartSource {
    fn read_part(&mut self, kind: PartKind) -> Result<Option<Vec<u8>>>;
}

/// A `.docx` package backed by a zip archive.
///
/// # Examples
///
/// ```rust,no_run
/// use docx_comments::{CommentParts, DocxPackage};
///
/// let mut pkg = DocxPackage::open("review.docx")?;
/// let parts = CommentParts::load(&mut pkg)?;
/// println!("{} bytes of comments", parts.comments().len());
/// # Ok::<(), docx_comments::Error>(())
/// ```
pub struct DocxPackage<R> {
    archive: zip::ZipArchive<R>,
}

impl DocxPackage<std::io::BufReader<std::fs::File>> {
    /// Open a package from a file path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = std::fs::File::open(path.as_ref())?;
        Self::from_reader(std::io::BufReader::new(file))
    }
}

impl DocxPackage<Cursor<Vec<u8>>> {
    /// Open a package held in memory.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        Self::from_reader(Cursor::new(bytes))
    }
}

impl<R: Read + Seek> DocxPackage<R> {
    /// Open a package from a reader.
    pub fn from_reader(reader: R) -> Result<Self> {
        let archive = zip::ZipArchive::new(reader)
            .map_err(|e| Error::Package(format!("not a valid .docx archive: {}", e)))?;
        Ok(Self { archive })
    }

    /// Check if a part exists in the package.
    pub fn has_part(&self, kind: PartKind) -> bool {
        self.archive.index_for_name(kind.part_name()).is_some()
    }
}

impl<R: Read + Seek> PartSource for DocxPackage<R> {
    fn read_part(&mut self, kind: PartKind) -> Result<Option<Vec<u8>>> {
        let mut file = match self.archive.by_name(kind.part_name()) {
            Ok(file) => file,
            Err(zip::result::ZipError::FileNotFound) => return Ok(None),
            Err(e) => return Err(Error::malformed(kind, e.to_string())),
        };

        let mut content = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut content)
            .map_err(|e| Error::malformed(kind, format!("unreadable part: {}", e)))?;
        debug!(part = %kind, bytes = content.len(), "read part");
        Ok(Some(content))
    }
}

/// The three raw buffers a report is built from.
#[derive(Debug, Clone, Default)]
pub struct CommentParts {
    comments: Vec<u8>,
    comments_extended: Vec<u8>,
    document: Vec<u8>,
}

impl CommentParts {
    /// Wrap buffers that were obtained elsewhere.
    pub fn new(
        comments: impl Into<Vec<u8>>,
        comments_extended: impl Into<Vec<u8>>,
        document: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            comments: comments.into(),
            comments_extended: comments_extended.into(),
            document: document.into(),
        }
    }

    /// Read all three parts from a source.
    ///
    /// Every part is required; the first absent one fails the load.
    pub fn load<S: PartSource + ?Sized>(source: &mut S) -> Result<Self> {
        let mut read = |kind: PartKind| -> Result<Vec<u8>> {
            source.read_part(kind)?.ok_or(Error::MissingPart(kind))
        };
        Ok(Self {
            comments: read(PartKind::Comments)?,
            comments_extended: read(PartKind::CommentsExtended)?,
            document: read(PartKind::Document)?,
        })
    }

    /// Open a `.docx` file and read its comment parts.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut pkg = DocxPackage::open(path)?;
        Self::load(&mut pkg)
    }

    #[inline]
    pub fn comments(&self) -> &[u8] {
        &self.comments
    }

    #[inline]
    pub fn comments_extended(&self) -> &[u8] {
        &self.comments_extended
    }

    #[inline]
    pub fn document(&self) -> &[u8] {
        &self.document
    }

    /// The buffer for a given part.
    pub fn part(&self, kind: PartKind) -> &[u8] {
        match kind {
            PartKind::Comments => &self.comments,
            PartKind::CommentsExtended => &self.comments_extended,
            PartKind::Document => &self.document,
        }
    }

    /// Write the raw parts into a directory, one file per part.
    ///
    /// Useful for inspecting the markup of a document that reconciles badly.
    pub fn dump_to_dir<P: AsRef<Path>>(&self, dir: P) -> Result<()> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        for kind in PartKind::ALL {
            std::fs::write(dir.join(kind.file_name()), self.part(kind))?;
        }
        Ok(())
    }
}

impl PartSource for CommentParts {
    fn read_part(&mut self, kind: PartKind) -> Result<Option<Vec<u8>>> {
        Ok(Some(self.part(kind).to_vec()))
    }
}
