/// AST (Abstract Syntax Tree) module
/// Contains all definitions related to the AST structure
///
/// The tree is produced by the parser and read, never rewritten, by the
/// checker and the interpreter (the checker only records resolved types).
///
/// Submodules:
/// - ast: Program and declaration nodes
/// - expressions: Definitions for the expression kinds
/// - statements: Definitions for the statement kinds
/// - types: Definitions for type representations in the AST
pub mod ast;
pub mod expressions;
pub mod statements;
pub mod types;
