// Copyright (c) 2025 bilicrawl contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

mod client_test;
mod crawl_test;
mod recommend_test;
