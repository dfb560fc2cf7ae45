use proc_macro::TokenStream as TokenStream1;
use quote::ToTokens;

/// Guards a `Round` method behind a single game phase. The attribute names
/// the `RoundPhase` variant the method is valid in; any call outside that
/// phase returns `EngineError::WrongPhase` before the body runs.
///
/// For example, `#[allowed_phase(Dealing)]` makes a method first check that
/// `self.phase == RoundPhase::Dealing`.
#[proc_macro_attribute]
pub fn allowed_phase(attr: TokenStream1, item: TokenStream1) -> TokenStream1 {
    let mut ast: syn::ImplItemFn = syn::parse(item).unwrap();
    let phase = attr.to_string();
    let function_name = ast.sig.ident.to_string();
    let code = format!(
        r#"
    if self.phase != RoundPhase::{} {{
        return Err(EngineError::WrongPhase {{
            call: "{}",
            expected: "{}",
        }});
    }}
"#,
        phase, function_name, phase
    );
    let early_return: TokenStream1 = code.parse().unwrap();
    let early_return: syn::Stmt = syn::parse(early_return).unwrap();
    ast.block.stmts.insert(0, early_return);
    ast.into_token_stream().into()
}
