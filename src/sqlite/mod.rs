// SQLite driver - runs each named database on its own worker thread
//
// - config: storage location options and the `Driver` implementation
// - params: conversion from `RowValues` to rusqlite values
// - query: statement execution and row extraction on the worker thread
// - worker: command channel, dispatcher loop and the async connection handle

pub mod config;
pub mod params;
pub mod query;
pub mod worker;

pub use config::{SqliteDriver, SqliteDriverOptions, SqliteDriverOptionsBuilder, SqliteStorage};
pub use worker::SqliteConnection;
