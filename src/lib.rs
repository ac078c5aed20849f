//! # Contact Book
//!
//! A local contact database with a vCard import pipeline.
//!
//! Contacts, their organizational groups, their roles and the links between
//! them live in a single SQLite file. Cards from a `.vcf` export are parsed,
//! normalized field by field and written as rows; fields that cannot be read
//! are stored as `NULL` or a marker string and reported, never fatal.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────────────────┐   ┌──────────┐
//! │  .vcf    │──▶│ vcard → extract →    │──▶│  SQLite  │
//! │  file    │   │ stringify → ingest   │   │  store   │
//! └──────────┘   └──────────────────────┘   └────┬─────┘
//!                                                │
//!                                          ┌─────┴────┐
//!                                          │   CLI    │
//!                                          │ (cbook)  │
//!                                          └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! cbook init                     # create database
//! cbook import contacts.vcf      # import a vCard export
//! cbook list contact             # ids and names
//! cbook show contact 1 --json
//! ```
//!
//! ## Library use
//!
//! The pipeline stages are usable on their own:
//!
//! ```
//! use contact_book::extract::extract_or_absent;
//! use contact_book::stringify::{stringify, stringify_all};
//! use contact_book::vcard;
//!
//! let cards = vcard::parse("BEGIN:VCARD\nFN:Jane Doe\nTEL:555-1111\nTEL:555-2222\nEND:VCARD\n");
//! let card = &cards[0];
//!
//! let tel = extract_or_absent(card, "tel");
//! assert_eq!(stringify_all(&card.values, tel.nodes()), "555-1111, 555-2222");
//!
//! let first = tel.first().unwrap();
//! assert_eq!(stringify(&card.values, first), "555-1111");
//! assert!(extract_or_absent(card, "photo").is_absent());
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema creation |
//! | [`models`] | Row types written by the import |
//! | [`vcard`] | vCard lexer and parser |
//! | [`extract`] | Reading named properties off a card |
//! | [`stringify`] | Flattening property values to text |
//! | [`ingest`] | Import pipeline |
//! | [`store`] | Row-level insert, update, delete and reads |
//! | [`get`] | Read commands |
//! | [`edit`] | Write commands |
//! | [`stats`] | Database statistics |

pub mod config;
pub mod db;
pub mod edit;
pub mod extract;
pub mod get;
pub mod ingest;
pub mod migrate;
pub mod models;
pub mod stats;
pub mod store;
pub mod stringify;
pub mod vcard;
