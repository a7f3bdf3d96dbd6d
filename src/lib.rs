//! # shopsmarter
//!
//! Backend for a visual shopping assistant: upload a photo and/or type what
//! you're looking for, get ranked product recommendations with reasons.
//!
//! ## Architecture
//!
//! ```text
//!          ┌──────────────┐            ┌──────────────┐
//!          │ Query Image  │            │ Text Prompt  │
//!          └──────┬───────┘            └──────┬───────┘
//!           ┌─────┴──────┐                    │
//!           ▼            ▼                    ▼
//!   ┌──────────────┐ ┌──────────────┐ ┌──────────────────┐
//!   │ Vision Model │ │  Embedding   │ │ Keyword Extract  │
//!   │ (description)│ │ (histogram / │ │ (stop words,     │
//!   └──────┬───────┘ │  http)       │ │  lemmatization)  │
//!          │         └──────┬───────┘ └────────┬─────────┘
//!          │                ▼                  │
//!          │        ┌───────────────┐          │
//!          │        │ Cosine vs.    │          │
//!          │        │ catalog, keep │          │
//!          │        │ top_k × 2     │          │
//!          │        └──────┬────────┘          │
//!          │               │ top 3 names       │
//!          ▼               ▼                   ▼
//!   ┌───────────────────────────────────────────────┐
//!   │  Refinement LLM (gemini / openai / ollama)    │
//!   │  → attributes, category, style, keywords      │
//!   └───────────────────────┬───────────────────────┘
//!                           ▼
//!   ┌───────────────────────────────────────────────┐
//!   │  Scoring: visual × 10 + matched keywords × 2.5│
//!   │  over visual candidates (or whole catalog)    │
//!   └───────────────────────┬───────────────────────┘
//!                           ▼
//!                 ┌───────────────────┐
//!                 │ Top-k with reasons│
//!                 └───────────────────┘
//! ```
//!
//! Every external signal is optional. Without an API key, a readable image
//! or catalog embeddings, the pipeline ranks on whatever is left.
//!
//! ## Module Overview
//!
//! - [`config`] - Environment-based configuration for server, models and scoring weights
//! - [`models`] - Product, recommendation and request/response types
//! - [`catalog`] - Catalog loading, image URLs, embedding annotation, demo products
//! - [`llm::embeddings`] - Image embeddings: local colour histogram or OpenAI-compatible API
//! - [`llm::vision`] - Image description via an OpenAI-compatible vision chat model
//! - [`llm::refine`] - Structured search refinement via Gemini, OpenAI or Ollama
//! - [`search::vector`] - Cosine similarity ranking over catalog embeddings
//! - [`search::keywords`] - Keyword extraction from free-text prompts
//! - [`search::scoring`] - Signal merging, reasons and final ranking
//! - [`pipeline`] - End-to-end recommendation flow
//! - [`api`] - Axum HTTP handlers
//! - [`state`] - Shared application state holding config, catalog and HTTP client

pub mod api;
pub mod catalog;
pub mod config;
pub mod llm;
pub mod models;
pub mod pipeline;
pub mod search;
pub mod state;
