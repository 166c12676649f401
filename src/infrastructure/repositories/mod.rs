// Copyright (c) 2025 bilicrawl contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

pub mod memory_video_repo;

pub use memory_video_repo::InMemoryVideoRepository;
