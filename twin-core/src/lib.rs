// twin-core/src/lib.rs

// 1. Mandatory documentation for production code
#![allow(missing_docs)]

// 2. Memory safety
#![deny(unsafe_code)]
// 3. Robustness
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
// 4. Performance
#![warn(clippy::perf)]

// --- MODULES HEXAGONAUX ---

// 1. Ports (Interfaces / Traits)
// Contrat avec la Storage API
pub mod ports;

// 2. Domain (Cœur du métier)
// Parser de références, registre d'entités, index, jobs, samples.
// Ne dépend de RIEN d'autre (ni infra, ni app).
pub mod domain;

// 3. Infrastructure (Adapters)
// Scanner, client HTTP, config, templates, écritures atomiques
pub mod infrastructure;

// 4. Application (Use Cases)
// Génération du twin, rapport de lignage, nettoyage
pub mod application;

// --- GESTION DES ERREURS GLOBALE ---
pub mod error;

// --- RE-EXPORTS (FACADE) ---
pub use error::TwinError;
