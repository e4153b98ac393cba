//! An endpoint runtime for Media over QUIC Transport (MOQT).
//!
//! Tracks are named sequences of objects published under a (namespace, name)
//! pair. This crate implements the protocol engine: the wire codec for every
//! control and data message, the session state machine that negotiates setup
//! and multiplexes the control stream, the per-connection track registries,
//! and the object dispatcher that frames objects onto datagrams or
//! unidirectional streams per the track's delivery mode.
//!
//! The QUIC layer is consumed through [`web_transport`]; the engine performs
//! no I/O of its own beyond it.

pub mod coding;
pub mod data;
pub mod message;
pub mod session;
pub mod setup;
pub mod track;
