// Copyright (c) 2025 bilicrawl contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

pub mod video_repository;

pub use video_repository::{RepositoryError, VideoFilter, VideoRepository};
