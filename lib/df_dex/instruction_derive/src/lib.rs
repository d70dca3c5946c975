// allowing panics since this is the standard way to show an
// error message from a proc-macro derive crate.
#![allow(clippy::panic)]

//! This crate introduces a proc macro derive to specifically derive
//! `df_dex::instrs::Instruction` implementation for Dalvik instructions,
//! from proc macro attributes.
//!
//! Every opcode of the disassembled streams carries its mnemonic, its
//! Dalvik format (from which the width in 16-bit code units is derived) and
//! two markers used by the fact translator: `payload` for the switch and
//! array-data pseudo-instructions, and `optional` for opcodes that can be
//! skipped without corrupting the instruction numbering.

extern crate proc_macro;

use proc_macro::TokenStream;
use proc_macro2::{Span, TokenStream as TokenStream2};
use quote::quote;
use syn::{
    parse_macro_input, Attribute, Data, DeriveInput, Fields, Ident, Lit, LitInt, LitStr, Meta,
    NestedMeta, Variant,
};

/// The main Dalvik bytecode `Instruction` proc macro derive.
///
/// It derives implementation of `df_dex::instrs::Instruction` trait, using the
/// following attributes:
/// - `mnemonic` is the name printed in listings and logs,
/// - `format` is the Dex format of the instruction, its first digit being the
/// instruction width in code units
/// (see [Dalvik Executable instruction formats](https://source.android.com/devices/tech/dalvik/instruction-formats)),
/// - `size` gives a width expression over fields `_0`, `_1`... when `format` is `custom`,
/// - `payload` marks data pseudo-instructions (default: `false`),
/// - `optional` marks opcodes which are tolerated and ignored (default: `false`).
///
/// # Example
///
/// ```rust
/// trait Instruction {
///     fn mnemonic(&self) -> &str;
///     fn size(&self) -> usize;
///     fn is_payload(&self) -> bool;
///     fn is_optional(&self) -> bool;
/// }
///
/// #[derive(instruction_derive::Instruction)]
/// pub enum SmallInstr {
///     // Waste cycles.
///     #[instruction(mnemonic = "nop", format = "10x")]
///     Nop,
///     // Raw data.
///     #[instruction(mnemonic = "data", format = "custom", size = "_0.len() + 1", payload)]
///     Data(Vec<u16>),
/// }
/// ```
#[proc_macro_derive(Instruction, attributes(instruction))]
pub fn instruction_derive(input: TokenStream) -> TokenStream {
    let ast = parse_macro_input!(input as DeriveInput);
    let Data::Enum(data) = &ast.data else {
        panic!("#[derive(Instruction)] is only defined for enums")
    };
    let name = &ast.ident;
    let opcodes: Vec<Opcode> = data.variants.iter().map(Opcode::parse).collect();

    let mnemonic_arms = opcodes.iter().map(|op| {
        let pattern = op.pattern(name, false);
        let mnemonic = &op.mnemonic;
        quote! { #pattern => #mnemonic, }
    });
    let size_arms = opcodes.iter().map(|op| {
        let pattern = op.pattern(name, true);
        let size = &op.size;
        quote! { #pattern => #size, }
    });
    let payload_arms = opcodes.iter().map(|op| {
        let pattern = op.pattern(name, false);
        let payload = op.payload;
        quote! { #pattern => #payload, }
    });
    let optional_arms = opcodes.iter().map(|op| {
        let pattern = op.pattern(name, false);
        let optional = op.optional;
        quote! { #pattern => #optional, }
    });

    let gen = quote! {
        impl Instruction for #name {
            fn mnemonic(&self) -> &str {
                match self {
                    #(#mnemonic_arms)*
                }
            }

            fn size(&self) -> usize {
                match self {
                    #(#size_arms)*
                }
            }

            fn is_payload(&self) -> bool {
                match self {
                    #(#payload_arms)*
                }
            }

            fn is_optional(&self) -> bool {
                match self {
                    #(#optional_arms)*
                }
            }
        }
    };
    gen.into()
}

/// Attributes of one instruction variant.
struct Opcode {
    ident: Ident,
    fields: Fields,
    mnemonic: LitStr,
    size: TokenStream2,
    payload: bool,
    optional: bool,
}

impl Opcode {
    fn parse(variant: &Variant) -> Self {
        let mut mnemonic = None;
        let mut format = None;
        let mut size = None;
        let mut payload = false;
        let mut optional = false;

        for nested in variant.attrs.iter().flat_map(instruction_metas) {
            match nested {
                // a bare flag such as `payload` reads as `payload = true`
                Meta::Path(path) if path.is_ident("payload") => payload = true,
                Meta::Path(path) if path.is_ident("optional") => optional = true,
                Meta::NameValue(nv) => {
                    let Lit::Str(value) = nv.lit else {
                        panic!("expected string value in #[instruction(...)]")
                    };
                    if nv.path.is_ident("mnemonic") {
                        mnemonic = Some(value);
                    } else if nv.path.is_ident("format") {
                        format = Some(value);
                    } else if nv.path.is_ident("size") {
                        size = Some(value);
                    } else {
                        panic!("unknown #[instruction(...)] key");
                    }
                }
                _ => panic!("expected #[instruction(...)]"),
            }
        }

        let mnemonic = mnemonic.unwrap_or_else(|| panic!("missing 'mnemonic' attribute"));
        let format = format
            .unwrap_or_else(|| panic!("missing 'format' attribute"))
            .value();
        let size = if format == "custom" {
            size.unwrap_or_else(|| panic!("missing 'size' attribute for custom format"))
                .parse::<TokenStream2>()
                .unwrap_or_else(|err| panic!("bad 'size' expression: {err}"))
        } else {
            match format.chars().next().and_then(|c| c.to_digit(10)) {
                Some(width) => {
                    let width = LitInt::new(&width.to_string(), Span::call_site());
                    quote! { #width }
                }
                None => panic!("bad 'format' attribute"),
            }
        };

        Self {
            ident: variant.ident.clone(),
            fields: variant.fields.clone(),
            mnemonic,
            size,
            payload,
            optional,
        }
    }

    /// Match pattern of the variant; fields are bound to `_0`, `_1`... when
    /// `bind` is set.
    fn pattern(&self, name: &Ident, bind: bool) -> TokenStream2 {
        let ident = &self.ident;
        let fields = match &self.fields {
            Fields::Named(named) if bind => {
                let params = named.named.iter().map(|field| &field.ident);
                quote! {{ #(#params),* }}
            }
            Fields::Named(_) => quote! { { .. } },
            Fields::Unnamed(unnamed) => {
                let params = (0..unnamed.unnamed.len()).map(|i| {
                    if bind {
                        let field = Ident::new(&format!("_{i}"), Span::call_site());
                        quote! { #field }
                    } else {
                        quote! { _ }
                    }
                });
                quote! {(#(#params),*)}
            }
            Fields::Unit => quote! {},
        };
        quote! { #name::#ident #fields }
    }
}

fn instruction_metas(attr: &Attribute) -> Vec<Meta> {
    if !attr.path.is_ident("instruction") {
        return Vec::new();
    }
    match attr.parse_meta() {
        Ok(Meta::List(list)) => list
            .nested
            .into_iter()
            .map(|nested| match nested {
                NestedMeta::Meta(meta) => meta,
                NestedMeta::Lit(_) => panic!("expected #[instruction(key = \"value\")]"),
            })
            .collect(),
        _ => panic!("expected #[instruction(...)]"),
    }
}
