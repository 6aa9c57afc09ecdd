/// Custom middleware
///
/// - `security`: Security headers applied to every response

pub mod security;
