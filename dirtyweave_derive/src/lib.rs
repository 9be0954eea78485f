use dirtyweave::pass::WRITER_PARAM;
use dirtyweave::{
    AllClasses, AttributeDeclaration, CapabilityComposer, ClassDefinition, ClassReport,
    DirtyTrackingPass, Expr, GenericArg, MethodDeclaration, Modifiers, Parameter, PassConfig,
    PropertyAction, Statement, TypeRef, Visibility, WeaveError,
};
use proc_macro::TokenStream;
use proc_macro2::{Span, TokenStream as TokenStream2};
use quote::{format_ident, quote};
use std::collections::HashMap;
use syn::parse::Parser;
use syn::{
    Fields, FnArg, Ident, ImplItem, ImplItemFn, Item, ItemImpl, ItemMod, ItemStruct, Pat,
    ReturnType, Type, parse_macro_input, parse_quote, spanned::Spanned,
};

/// Field added to structs that get the tracking capability from the macro.
const STATE_FIELD: &str = "__dirty";
const STATE_TYPE: &str = "DirtySet";

/// Adds change tracking to the structs of an inline module.
///
/// Every struct with named fields gets `dirtyweave::DirtyTracking`. Public
/// fields without accessors get a `get_x` reader (plus `is_x` for `bool`)
/// and a `set_x` writer that records the change. Existing `set_x` writers
/// taking `&mut self` get the recording call as their first statement.
///
/// Fields marked `#[transient]` and writers marked `#[raw_access]` are left
/// alone. `id` and `version` fields are never tracked.
///
/// A struct without a `DirtySet` field gets a hidden `pub __dirty` field.
/// Build such structs through `Default` (or a constructor inside the
/// module) rather than a struct literal, which would have to name it.
///
/// ```ignore
/// #[dirty_tracked]
/// mod bank {
///     #[derive(Default)]
///     pub struct Account {
///         pub id: u64,
///         pub balance: f64,
///     }
/// }
///
/// let mut account = bank::Account::default();
/// account.track_changes();
/// account.set_balance(10.0);
/// assert!(account.has_property_changed("balance"));
/// ```
#[proc_macro_attribute]
pub fn dirty_tracked(attr: TokenStream, item: TokenStream) -> TokenStream {
    if !attr.is_empty() {
        return syn::Error::new(
            proc_macro2::Span::call_site(),
            "#[dirty_tracked] does not accept arguments",
        )
        .to_compile_error()
        .into();
    }

    let input = parse_macro_input!(item as ItemMod);
    match expand_dirty_tracked(input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand_dirty_tracked(mut module: ItemMod) -> syn::Result<TokenStream2> {
    let span = module.ident.span();
    let Some((_, items)) = module.content.as_mut() else {
        return Err(syn::Error::new(
            span,
            "#[dirty_tracked] must be applied to an inline module (`mod name { ... }`)",
        ));
    };

    let pass = DirtyTrackingPass::new(PassConfig::rust()).map_err(|err| weave_error(span, err))?;
    let config = pass.config().clone();

    let mut classes = lower_module(items, &config);
    let mut composer = HiddenStateComposer;
    let reports = pass
        .transform_all(&mut classes, &AllClasses, Some(&mut composer))
        .map_err(|err| weave_error(span, err))?;

    let mut generated = Vec::new();
    for report in &reports {
        generated.extend(emit_class(items, report, &config)?);
    }
    strip_markers(items, &config);
    items.extend(generated);

    Ok(quote!(#module))
}

fn weave_error(span: Span, err: WeaveError) -> syn::Error {
    syn::Error::new(span, err.to_string())
}

/// Gives an attached struct the field that backs `DirtyTracking`.
struct HiddenStateComposer;

impl CapabilityComposer for HiddenStateComposer {
    fn compose(&mut self, class: &mut ClassDefinition, _config: &PassConfig) -> dirtyweave::Result<()> {
        if class.find_attribute(STATE_FIELD).is_some() {
            return Err(WeaveError::CompositionError(format!(
                "struct `{}` already has a field named `{}`",
                class.name, STATE_FIELD
            )));
        }
        class.attributes.push(
            AttributeDeclaration::new(STATE_FIELD, TypeRef::new(STATE_TYPE))
                .visibility(Visibility::Private)
                .modifiers(Modifiers {
                    is_transient: true,
                    ..Modifiers::none()
                }),
        );
        Ok(())
    }
}

// ============================================================================
// Lowering: Rust items -> class model
// ============================================================================

fn lower_module(items: &[Item], config: &PassConfig) -> Vec<ClassDefinition> {
    let mut classes = Vec::new();

    for item in items {
        let Item::Struct(item_struct) = item else {
            continue;
        };
        let Fields::Named(fields) = &item_struct.fields else {
            continue;
        };

        let name = item_struct.ident.to_string();
        let mut class = ClassDefinition::new(name.clone());

        for field in &fields.named {
            let Some(ident) = &field.ident else {
                continue;
            };
            if is_state_type(&field.ty) {
                class.capabilities.push(TypeRef::new(config.capability.clone()));
                continue;
            }
            let mut attribute = AttributeDeclaration::new(ident.to_string(), lower_type(&field.ty))
                .visibility(lower_visibility(&field.vis));
            if has_marker(&field.attrs, &config.transient_marker) {
                attribute = attribute.annotated(config.transient_marker.clone());
            }
            class.attributes.push(attribute);
        }

        for item in items {
            let Item::Impl(item_impl) = item else {
                continue;
            };
            if impl_target(item_impl).as_deref() != Some(name.as_str()) {
                continue;
            }
            match &item_impl.trait_ {
                Some((_, path, _)) => {
                    if path_ends_with_ident(path, &config.capability)
                        && !class.has_capability(&config.capability)
                    {
                        class.capabilities.push(TypeRef::new(config.capability.clone()));
                    }
                }
                None => {
                    for impl_item in &item_impl.items {
                        if let ImplItem::Fn(method) = impl_item {
                            class.methods.push(lower_method(method, config));
                        }
                    }
                }
            }
        }

        classes.push(class);
    }

    classes
}

fn lower_method(method: &ImplItemFn, config: &PassConfig) -> MethodDeclaration {
    let sig = &method.sig;
    let mut lowered =
        MethodDeclaration::new(sig.ident.to_string()).visibility(lower_visibility(&method.vis));

    // Associated functions can never be accessors.
    if sig.receiver().is_none() {
        lowered.modifiers = Modifiers {
            is_static: true,
            ..Modifiers::none()
        };
    }

    for (idx, input) in sig.inputs.iter().enumerate() {
        let FnArg::Typed(pat_type) = input else {
            continue;
        };
        let name = match pat_type.pat.as_ref() {
            Pat::Ident(pat_ident) => pat_ident.ident.to_string(),
            _ => format!("__arg{}", idx),
        };
        lowered.params.push(Parameter::new(name, lower_type(&pat_type.ty)));
    }

    if let ReturnType::Type(_, ty) = &sig.output {
        let ret = lower_type(ty);
        if ret.name != config.void_type {
            lowered.return_type = Some(ret);
        }
    }

    if has_marker(&method.attrs, &config.raw_accessor_marker) {
        lowered.annotations.push(config.raw_accessor_marker.clone());
    }

    lowered.body = Some(
        method
            .block
            .stmts
            .iter()
            .map(|stmt| lower_statement(stmt, config))
            .collect(),
    );
    lowered
}

fn lower_statement(stmt: &syn::Stmt, config: &PassConfig) -> Statement {
    if let syn::Stmt::Expr(expr, _) = stmt {
        if let Some((property, value)) = instrumentation_args(expr, &config.instrumentation_method)
        {
            return Statement::expr(Expr::call(
                config.instrumentation_method.clone(),
                vec![Expr::string(property), Expr::var(value)],
            ));
        }
    }
    Statement::Raw {
        text: quote!(#stmt).to_string(),
    }
}

/// Property and value of `self.mark_dirty("p", &v)` or
/// `DirtyTracking::mark_dirty(self, "p", &v)`.
fn instrumentation_args(expr: &syn::Expr, method: &str) -> Option<(String, String)> {
    let args: Vec<&syn::Expr> = match expr {
        syn::Expr::MethodCall(call) if call.method == method && is_self(&call.receiver) => {
            call.args.iter().collect()
        }
        syn::Expr::Call(call) => {
            let syn::Expr::Path(func) = call.func.as_ref() else {
                return None;
            };
            if !path_ends_with_ident(&func.path, method) {
                return None;
            }
            let mut args = call.args.iter();
            if !args.next().is_some_and(is_self) {
                return None;
            }
            args.collect()
        }
        _ => return None,
    };

    let [property, value] = args.as_slice() else {
        return None;
    };
    let syn::Expr::Lit(syn::ExprLit {
        lit: syn::Lit::Str(property),
        ..
    }) = *property
    else {
        return None;
    };
    Some((property.value(), plain_ident(value)?))
}

fn plain_ident(expr: &syn::Expr) -> Option<String> {
    match expr {
        syn::Expr::Reference(reference) => plain_ident(&reference.expr),
        syn::Expr::Path(path) => path.path.get_ident().map(ToString::to_string),
        _ => None,
    }
}

fn is_self(expr: &syn::Expr) -> bool {
    matches!(expr, syn::Expr::Path(path) if path.path.is_ident("self"))
}

fn lower_type(ty: &Type) -> TypeRef {
    match ty {
        Type::Path(type_path) if type_path.qself.is_none() => {
            let name = type_path
                .path
                .segments
                .iter()
                .map(|segment| segment.ident.to_string())
                .collect::<Vec<_>>()
                .join("::");
            let args = type_path
                .path
                .segments
                .last()
                .map(lower_generic_args)
                .unwrap_or_default();
            TypeRef::new(name).with_args(args)
        }
        Type::Reference(reference) => lower_type(&reference.elem),
        Type::Paren(inner) => lower_type(&inner.elem),
        Type::Group(inner) => lower_type(&inner.elem),
        Type::Tuple(tuple) if tuple.elems.is_empty() => TypeRef::new("()"),
        Type::Array(array) => {
            let inner = lower_type(&array.elem);
            let dims = inner.array_dims + 1;
            inner.array(dims)
        }
        Type::Slice(slice) => {
            let inner = lower_type(&slice.elem);
            let dims = inner.array_dims + 1;
            inner.array(dims)
        }
        other => TypeRef::new(quote!(#other).to_string()),
    }
}

fn lower_generic_args(segment: &syn::PathSegment) -> Vec<GenericArg> {
    let syn::PathArguments::AngleBracketed(arguments) = &segment.arguments else {
        return Vec::new();
    };
    arguments
        .args
        .iter()
        .filter_map(|arg| match arg {
            syn::GenericArgument::Type(ty) => Some(GenericArg::Concrete(lower_type(ty))),
            _ => None,
        })
        .collect()
}

fn lower_visibility(vis: &syn::Visibility) -> Visibility {
    match vis {
        syn::Visibility::Public(_) => Visibility::Public,
        syn::Visibility::Restricted(_) => Visibility::Package,
        syn::Visibility::Inherited => Visibility::Private,
    }
}

// ============================================================================
// Emission: pass outcome -> Rust items
// ============================================================================

fn emit_class(
    items: &mut [Item],
    report: &ClassReport,
    config: &PassConfig,
) -> syn::Result<Vec<Item>> {
    let mut extra = Vec::new();

    let (ident, generics, fields, mut state_field) = {
        let Some(item_struct) = find_struct_mut(items, &report.class_name) else {
            return Ok(extra);
        };
        let fields = named_fields(item_struct);
        let mut state_field = state_field_name(item_struct);

        if report.composed {
            let Fields::Named(named) = &mut item_struct.fields else {
                return Ok(extra);
            };
            let field_ident = format_ident!("{}", STATE_FIELD);
            named.named.push(syn::Field::parse_named.parse2(quote! {
                #[doc(hidden)]
                pub #field_ident: ::dirtyweave::DirtySet
            })?);
            state_field = Some(field_ident);
        }

        (
            item_struct.ident.clone(),
            item_struct.generics.clone(),
            fields,
            state_field,
        )
    };
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    if let Some(field) = state_field.take() {
        if !has_capability_impl(items, &report.class_name, &config.capability) {
            extra.push(parse_quote! {
                impl #impl_generics ::dirtyweave::DirtyTracking for #ident #ty_generics #where_clause {
                    fn dirty_state(&self) -> &::dirtyweave::DirtySet {
                        &self.#field
                    }

                    fn dirty_state_mut(&mut self) -> &mut ::dirtyweave::DirtySet {
                        &mut self.#field
                    }
                }
            });
        }
    }

    let mut accessors = Vec::new();
    for outcome in &report.properties {
        match &outcome.action {
            PropertyAction::Synthesized {
                reader,
                boolean_reader,
                writer,
            } => {
                let Some((field, ty)) = fields.get(&outcome.property) else {
                    return Err(syn::Error::new(
                        ident.span(),
                        format!("no field `{}` on `{}`", outcome.property, ident),
                    ));
                };
                let by_value = lower_type(ty).is_one_of(&config.primitive_types);

                if let Some(reader) = reader {
                    let reader = format_ident!("{}", reader);
                    accessors.push(if by_value {
                        quote!(pub fn #reader(&self) -> #ty { self.#field })
                    } else {
                        quote!(pub fn #reader(&self) -> &#ty { &self.#field })
                    });
                }
                if let Some(boolean_reader) = boolean_reader {
                    let boolean_reader = format_ident!("{}", boolean_reader);
                    accessors.push(quote!(pub fn #boolean_reader(&self) -> #ty { self.#field }));
                }

                let writer = format_ident!("{}", writer);
                let value = format_ident!("{}", WRITER_PARAM);
                let mark = instrumentation_call(config, &outcome.property, &value);
                accessors.push(quote! {
                    pub fn #writer(&mut self, #value: #ty) {
                        #mark
                        self.#field = #value;
                    }
                });
            }
            PropertyAction::Woven { writer } => {
                weave_writer(items, &report.class_name, writer, &outcome.property, config)?;
            }
            _ => {}
        }
    }

    if !accessors.is_empty() {
        extra.push(parse_quote! {
            impl #impl_generics #ident #ty_generics #where_clause {
                #(#accessors)*
            }
        });
    }

    Ok(extra)
}

fn instrumentation_call(config: &PassConfig, property: &str, value: &Ident) -> TokenStream2 {
    let method = format_ident!("{}", config.instrumentation_method);
    quote!(::dirtyweave::DirtyTracking::#method(self, #property, &#value);)
}

fn weave_writer(
    items: &mut [Item],
    class_name: &str,
    writer: &str,
    property: &str,
    config: &PassConfig,
) -> syn::Result<()> {
    for item in items.iter_mut() {
        let Item::Impl(item_impl) = item else {
            continue;
        };
        if item_impl.trait_.is_some() || impl_target(item_impl).as_deref() != Some(class_name) {
            continue;
        }

        for impl_item in item_impl.items.iter_mut() {
            let ImplItem::Fn(method) = impl_item else {
                continue;
            };
            if method.sig.ident != writer {
                continue;
            }

            let mutable_receiver = method
                .sig
                .receiver()
                .is_some_and(|receiver| receiver.reference.is_some() && receiver.mutability.is_some());
            if !mutable_receiver {
                return Err(syn::Error::new(
                    method.sig.span(),
                    format!("`{}` writes `{}` and must take `&mut self` to be tracked", writer, property),
                ));
            }

            let Some(FnArg::Typed(pat_type)) = method
                .sig
                .inputs
                .iter()
                .find(|input| matches!(input, FnArg::Typed(_)))
            else {
                continue;
            };
            let Pat::Ident(pat_ident) = pat_type.pat.as_ref() else {
                return Err(syn::Error::new(
                    pat_type.span(),
                    "tracked writers need a plain parameter name",
                ));
            };
            let value = pat_ident.ident.clone();

            let stmt: syn::Stmt = syn::parse2(instrumentation_call(config, property, &value))?;
            method.block.stmts.insert(0, stmt);
            return Ok(());
        }
    }

    Err(syn::Error::new(
        Span::call_site(),
        format!("writer `{}` of `{}` not found in the module", writer, class_name),
    ))
}

/// Removes the marker attributes that only exist for the pass.
fn strip_markers(items: &mut [Item], config: &PassConfig) {
    for item in items.iter_mut() {
        match item {
            Item::Struct(item_struct) => {
                if let Fields::Named(fields) = &mut item_struct.fields {
                    for field in fields.named.iter_mut() {
                        field
                            .attrs
                            .retain(|attr| !path_ends_with_ident(attr.path(), &config.transient_marker));
                    }
                }
            }
            Item::Impl(item_impl) => {
                for impl_item in item_impl.items.iter_mut() {
                    if let ImplItem::Fn(method) = impl_item {
                        method.attrs.retain(|attr| {
                            !path_ends_with_ident(attr.path(), &config.raw_accessor_marker)
                        });
                    }
                }
            }
            _ => {}
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn find_struct_mut<'a>(items: &'a mut [Item], name: &str) -> Option<&'a mut ItemStruct> {
    items.iter_mut().find_map(|item| match item {
        Item::Struct(item_struct) if item_struct.ident == name => Some(item_struct),
        _ => None,
    })
}

fn named_fields(item_struct: &ItemStruct) -> HashMap<String, (Ident, Type)> {
    let Fields::Named(fields) = &item_struct.fields else {
        return HashMap::new();
    };
    fields
        .named
        .iter()
        .filter_map(|field| {
            let ident = field.ident.clone()?;
            Some((ident.to_string(), (ident, field.ty.clone())))
        })
        .collect()
}

fn state_field_name(item_struct: &ItemStruct) -> Option<Ident> {
    let Fields::Named(fields) = &item_struct.fields else {
        return None;
    };
    fields
        .named
        .iter()
        .find(|field| is_state_type(&field.ty))
        .and_then(|field| field.ident.clone())
}

fn has_capability_impl(items: &[Item], class_name: &str, capability: &str) -> bool {
    items.iter().any(|item| match item {
        Item::Impl(item_impl) => {
            impl_target(item_impl).as_deref() == Some(class_name)
                && item_impl
                    .trait_
                    .as_ref()
                    .is_some_and(|(_, path, _)| path_ends_with_ident(path, capability))
        }
        _ => false,
    })
}

fn impl_target(item_impl: &ItemImpl) -> Option<String> {
    let Type::Path(type_path) = item_impl.self_ty.as_ref() else {
        return None;
    };
    if type_path.qself.is_some() {
        return None;
    }
    type_path
        .path
        .segments
        .last()
        .map(|segment| segment.ident.to_string())
}

fn is_state_type(ty: &Type) -> bool {
    let Type::Path(type_path) = ty else {
        return false;
    };
    path_ends_with_ident(&type_path.path, STATE_TYPE)
}

fn has_marker(attrs: &[syn::Attribute], marker: &str) -> bool {
    attrs.iter().any(|attr| path_ends_with_ident(attr.path(), marker))
}

fn path_ends_with_ident(path: &syn::Path, ident: &str) -> bool {
    path.segments
        .last()
        .map(|segment| segment.ident == ident)
        .unwrap_or(false)
}
