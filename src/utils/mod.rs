// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod textfile;

pub use textfile::{
    append_text_file, read_text_file, remove_empty_lines, write_text_file, TextFileError,
};
