//! # xfile - A crate for parsing DirectX .x model files
//!
//! ## Example
//!
//! ```ignore
//! use xfile::XFile;
//!
//! /// Prints the vertex and face count of every top-level mesh
//! fn main() {
//!     let file = XFile::from_path("model.x").expect("error loading x file");
//!
//!     for mesh in file.get_by_name("Mesh") {
//!         let vertices = mesh.get_structures(1).unwrap_or(&[]);
//!         let faces = mesh.get_structures(3).unwrap_or(&[]);
//!
//!         println!("{} vertices, {} faces", vertices.len(), faces.len());
//!     }
//! }
//! ```
//!
//! ## The .x file
//!
//! An .x file is a tree of data objects. Every data object is an instance of a template, and the template says which
//! members the object has and in what order. Templates can be declared in the file itself, but almost every exporter
//! only uses the standard ones, which this crate knows about. The following is how a triangle mesh looks like in a
//! text file:
//!
//! ```ignore
//! Mesh {
//!     3;                              // DWORD nVertices
//!     0.0; 0.0; 0.0;,                 // array Vector vertices[nVertices]
//!     1.0; 0.0; 0.0;,
//!     0.0; 1.0; 0.0;;
//!     1;                              // DWORD nFaces
//!     3; 0, 1, 2;;                    // array MeshFace faces[nFaces]
//!     MeshNormals { ... }             // [...]
//! }
//! ```
//!
//! The same data can be stored as text, as a stream of binary tokens, or as either of those compressed with DEFLATE.
//! The first 16 bytes of the file tell which one it is.
//!
//! ## This crate
//!
//! This crate turns any of the four flavors into the same generic tree of `Structure`s: a template name plus one
//! `Value` per member. Nothing is interpreted, a `Mesh` is just a `Structure` whose second value is an array of
//! `Vector` structures, so the crate works for files that use custom templates as well, as long as the templates are
//! added to the `TemplateRegistry` used to load them.
//!
//! Data objects of templates that aren't in the registry are skipped (and reported) instead of failing the load.
//! Everything else that doesn't match the templates is a `SyntaxError` and the file is not loaded at all.
//!
//! ### Diagnostics
//!
//! Problems are sent to a `Reporter` together with the name of the file and the offset (binary) or line and column
//! (text) where they were found. The default reporter forwards them to the `log` crate; pass a `Vec<Diagnostic>`
//! to `XFile::from_data_with` to collect them instead.
//!
//! ### Limitations
//!
//! This crate does not write .x files. Compressed files are expected to hold a single compressed block, which is
//! what exporters produce for files up to 32KB of uncompressed data.

pub mod diagnostics;
pub mod options;
pub mod parsers;
pub mod runtime;
pub mod structure;

pub use diagnostics::{Diagnostic, Location, LogReporter, Reporter, Severity};
pub use options::ParseOptions;
pub use parsers::{
    template::{Template, TemplateRegistry},
    SyntaxError, SyntaxErrorKind, XParseError,
};
pub use runtime::XFile;
pub use structure::{Structure, Value};
