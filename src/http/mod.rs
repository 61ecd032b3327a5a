//! Request handling for the load target.
//!
//! This is deliberately not an HTTP implementation. Inbound bytes are never
//! parsed into a request; each chunk is scanned for a keep-alive hint and
//! answered with one of two precomputed responses.
//!
//! # Modules
//!
//! - **`connection`**: per-connection engine running the read-classify-respond step
//! - **`detect`**: the keep-alive scan heuristic
//! - **`response`**: precomputed response buffers, built once at startup
//!
//! # Connection State Machine
//!
//! Each accepted connection runs the same loop until it closes:
//!
//! ```text
//!        ┌──────────────┐
//!        │     Open     │ ← Wait for readable bytes
//!        └──────┬───────┘
//!               │ one read (≤ 1024 bytes)
//!               ▼
//!     ┌───────────────────────┐
//!     │ classify and respond  │
//!     └──────┬────────────────┘
//!            ├─ keep-alive hint → keep-alive response → Open (same connection)
//!            ├─ no hint → close response, shutdown → Closed
//!            ├─ EOF → Closed (nothing sent)
//!            └─ read error → Closed (nothing sent)
//! ```
//!
//! `Closed` is terminal: the task returns, the socket is dropped, and the
//! connection is never touched again.

pub mod connection;
pub mod detect;
pub mod response;
