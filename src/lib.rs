//! Core of a DICOM metadata inspector and editor.
//!
//! An opened byte stream is decoded by the [`codec`] boundary, shaped
//! into an [`model::ElementTree`], indexed on demand by
//! [`search::SearchIndex`], navigated with [`search::SearchSession`],
//! and edited through [`edit::EditLedger`]. A [`session::FileSession`]
//! ties the pieces together across the open → edit → save lifecycle and
//! is the only type an embedding UI needs to drive.
//!
//! The crate does no rendering, no file dialogs, and no binary layout
//! work of its own; the `dicom` crate family supplies the codec and the
//! tag dictionary.

pub mod codec;
pub mod edit;
pub mod error;
pub mod model;
pub mod search;
pub mod session;
pub mod utils;

pub use codec::{Codec, PartTenCodec};
pub use edit::EditLedger;
pub use error::{CommitFailure, Error, Result};
pub use model::{ElementNode, ElementTree, NodePath, NodeValue, SequenceHop, Traverse};
pub use search::{FacetSelection, SearchIndex, SearchSession};
pub use session::FileSession;
