//! Open → inspect/search → edit → save lifecycle for one file.

use dicom::object::FileMetaTable;

use crate::codec::{Codec, PartTenCodec};
use crate::edit::EditLedger;
use crate::error::{Error, Result};
use crate::model::{ElementTree, NodePath};
use crate::search::{FacetSelection, SearchIndex, SearchSession};

/// Orchestrates the tree, the search index, and the edit ledger for one
/// open file. This is the only type external layers drive; everything
/// else hangs off it. Closed until `open` succeeds; Dirty means Open
/// with staged edits. All calls are synchronous and must be sequenced
/// by the caller.
#[derive(Debug)]
pub struct FileSession<C: Codec = PartTenCodec> {
    codec: C,
    state: SessionState,
}

#[derive(Debug)]
enum SessionState {
    Closed,
    Open(Box<OpenFile>),
}

#[derive(Debug)]
struct OpenFile {
    meta: FileMetaTable,
    tree: ElementTree,
    // built on first search, invalidated when the tree is replaced
    index: Option<SearchIndex>,
    ledger: EditLedger,
}

impl OpenFile {
    fn index(&mut self) -> &SearchIndex {
        let OpenFile { index, tree, .. } = self;
        index.get_or_insert_with(|| SearchIndex::build(tree))
    }
}

impl FileSession<PartTenCodec> {
    /// A closed session over the standard Part-10 codec.
    pub fn new() -> FileSession<PartTenCodec> {
        FileSession::with_codec(PartTenCodec)
    }
}

impl Default for FileSession<PartTenCodec> {
    fn default() -> Self {
        FileSession::new()
    }
}

impl<C: Codec> FileSession<C> {
    pub fn with_codec(codec: C) -> FileSession<C> {
        FileSession {
            codec,
            state: SessionState::Closed,
        }
    }

    /// Decodes `bytes` and builds a fresh tree, replacing whatever was
    /// open before. On failure the previous state is kept as it was.
    pub fn open(&mut self, bytes: &[u8]) -> Result<()> {
        let object = self.codec.decode(bytes)?;
        let meta = object.meta().clone();
        let tree = ElementTree::build(&object)?;
        log::info!("opened DICOM object with {} elements", tree.len());
        self.state = SessionState::Open(Box::new(OpenFile {
            meta,
            tree,
            index: None,
            ledger: EditLedger::new(),
        }));
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, SessionState::Open(_))
    }

    /// Open with at least one staged edit.
    pub fn is_dirty(&self) -> bool {
        match &self.state {
            SessionState::Open(open) => !open.ledger.is_empty(),
            SessionState::Closed => false,
        }
    }

    pub fn tree(&self) -> Option<&ElementTree> {
        match &self.state {
            SessionState::Open(open) => Some(&open.tree),
            SessionState::Closed => None,
        }
    }

    /// File meta of the open object, preserved verbatim for re-encoding.
    pub fn meta(&self) -> Option<&FileMetaTable> {
        match &self.state {
            SessionState::Open(open) => Some(&open.meta),
            SessionState::Closed => None,
        }
    }

    pub fn pending_edits(&self) -> usize {
        match &self.state {
            SessionState::Open(open) => open.ledger.len(),
            SessionState::Closed => 0,
        }
    }

    /// The search index for the current tree generation, built on first
    /// use.
    pub fn search_index(&mut self) -> Result<&SearchIndex> {
        match &mut self.state {
            SessionState::Open(open) => Ok(open.index()),
            SessionState::Closed => Err(Error::SessionClosed),
        }
    }

    /// Starts a search session for `text` over the selected facets.
    /// Subsequent keystrokes go through [`SearchSession::set_query`]
    /// against [`FileSession::search_index`].
    pub fn search(&mut self, text: &str, facets: FacetSelection) -> Result<SearchSession> {
        let index = self.search_index()?;
        let mut session = SearchSession::with_facets(facets);
        session.set_query(index, text);
        Ok(session)
    }

    /// Stages a value edit; the tree itself stays untouched until
    /// `save`.
    pub fn edit(&mut self, path: &NodePath, text: &str) -> Result<()> {
        match &mut self.state {
            SessionState::Open(open) => open.ledger.stage(&open.tree, path, text),
            SessionState::Closed => Err(Error::SessionClosed),
        }
    }

    pub fn discard_edit(&mut self, path: &NodePath) -> Result<bool> {
        match &mut self.state {
            SessionState::Open(open) => Ok(open.ledger.discard(path)),
            SessionState::Closed => Err(Error::SessionClosed),
        }
    }

    pub fn discard_all_edits(&mut self) -> Result<()> {
        match &mut self.state {
            SessionState::Open(open) => {
                open.ledger.discard_all();
                Ok(())
            }
            SessionState::Closed => Err(Error::SessionClosed),
        }
    }

    /// Commits every staged edit and re-encodes the file. On success the
    /// session adopts the committed tree, the ledger is cleared, and the
    /// encoded bytes are returned for the caller to write out. On any
    /// failure the session keeps its tree and staged edits, so nothing
    /// is lost.
    pub fn save(&mut self) -> Result<Vec<u8>> {
        let open = match &mut self.state {
            SessionState::Open(open) => open,
            SessionState::Closed => return Err(Error::SessionClosed),
        };
        let committed = open.ledger.commit(&open.tree)?;
        let object = committed.to_dataset().with_exact_meta(open.meta.clone());
        let bytes = self.codec.encode(&object)?;
        open.tree = committed;
        open.index = None;
        open.ledger.discard_all();
        log::info!("saved DICOM object ({} bytes)", bytes.len());
        Ok(bytes)
    }

    /// Discards the tree and all staged edits.
    pub fn close(&mut self) {
        self.state = SessionState::Closed;
    }
}
