// Copyright (c) 2025 bilicrawl contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

pub mod quality_scorer;
pub mod recommend_engine;
pub mod topic_classifier;

pub use quality_scorer::QualityScorer;
pub use recommend_engine::{RecommendEngine, RecommendQuery, Strategy};
pub use topic_classifier::{Classification, ClassifierStrategy, TopicClassifier};
