use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, LitStr};

/// Parses a dynamic SQL body into a `batislens_core::mapper::Statement`.
///
/// The body is wrapped as `<select id="test">` inside a mapper with
/// namespace `test`, so `<include>` targets must be qualified or live in a
/// mapper registered under that namespace.
#[proc_macro]
pub fn statement(input: TokenStream) -> TokenStream {
    let input_str = parse_macro_input!(input as LitStr);
    let document = format!(
        r#"<mapper namespace="test"><select id="test">{}</select></mapper>"#,
        input_str.value()
    );

    quote! {
        {
            let mapper = ::batislens_core::mapper::MapperDefinition::parse(#document)
                .expect("Failed to parse statement body");
            mapper
                .statement("test")
                .cloned()
                .expect("Wrapped statement must exist")
        }
    }
    .into()
}

/// Parses a Java type reference, expanding MyBatis aliases first.
#[proc_macro]
pub fn type_ref(input: TokenStream) -> TokenStream {
    let input_str = parse_macro_input!(input as LitStr);
    let type_str = input_str.value();

    quote! {
        ::batislens_core::types::TypeRef::parse(
            &::batislens_core::types::expand_alias(#type_str)
        )
        .expect("Failed to parse type reference")
    }
    .into()
}
