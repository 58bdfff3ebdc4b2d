//! Canonical EHIR printing of a parsed [`Module`].
//!
//! Output is one item per line group, instructions indented by two spaces.
//! Error nodes print as comments so the result still parses.

use crate::surface::*;

pub fn format_module(module: &Module) -> String {
    let mut out = String::new();
    for (index, item) in module.items().enumerate() {
        if index > 0 {
            out.push('\n');
        }
        format_item(module, item, &mut out);
    }
    out
}

fn format_item(module: &Module, item: &Item, out: &mut String) {
    match item {
        Item::Import(import) => {
            push_visibility(import.public, out);
            out.push_str(&format!(
                "imp {}::{}\n",
                import.source.name, import.symbol.name
            ));
        }
        Item::StructDecl(decl) => {
            push_visibility(decl.public, out);
            out.push_str(&decl.name.name);
            push_generic_params(&decl.generics, out);
            match decl.variant.kind {
                VariantKind::UnitLike => {}
                VariantKind::CLike { .. } => {
                    out.push(' ');
                    out.push_str(&format_variant(module, &decl.variant));
                }
                VariantKind::TupleLike { .. } => {
                    out.push_str(&format_variant(module, &decl.variant))
                }
            }
            out.push('\n');
        }
        Item::EnumDecl(decl) => {
            push_visibility(decl.public, out);
            out.push_str("enum ");
            out.push_str(&decl.name.name);
            push_generic_params(&decl.generics, out);
            let variants: Vec<String> = decl
                .variants
                .iter()
                .map(|variant| format_variant(module, variant))
                .collect();
            out.push_str(&format!(" {{ {} }}\n", variants.join(", ")));
        }
        Item::FnDecl(decl) => {
            push_visibility(decl.public, out);
            out.push_str("fn ");
            out.push_str(&decl.name.name);
            push_generic_params(&decl.generics, out);
            push_signature(module, &decl.params, decl.ret_type, out);
            out.push(' ');
            format_body(module, &decl.body, out);
        }
        Item::ForeignFnDecl(decl) => {
            push_visibility(decl.public, out);
            out.push_str("fdecl ");
            out.push_str(&decl.name.name);
            push_signature(module, &decl.params, decl.ret_type, out);
            out.push('\n');
        }
        Item::ForeignFnDefn(defn) => {
            out.push_str("fdefi ");
            out.push_str(&defn.name.name);
            out.push(' ');
            format_body(module, &defn.body, out);
        }
        Item::Error { .. } => out.push_str("; <error>\n"),
    }
}

fn push_visibility(public: bool, out: &mut String) {
    if public {
        out.push('@');
    }
}

fn push_generic_params(generics: &[SpannedName], out: &mut String) {
    if generics.is_empty() {
        return;
    }
    let names: Vec<&str> = generics.iter().map(|name| name.name.as_str()).collect();
    out.push_str(&format!("[{}]", names.join(", ")));
}

fn push_signature(module: &Module, params: &[Param], ret_type: Option<TypeId>, out: &mut String) {
    let params: Vec<String> = params
        .iter()
        .map(|param| format!("{}: {}", param.name.name, format_type(module, param.ty)))
        .collect();
    out.push_str(&format!("({})", params.join(", ")));
    if let Some(ty) = ret_type {
        out.push_str(" -> ");
        out.push_str(&format_type(module, ty));
    }
}

fn format_variant(module: &Module, variant: &Variant) -> String {
    match &variant.kind {
        VariantKind::CLike { fields } => {
            let fields: Vec<String> = fields
                .iter()
                .map(|field| format!("{}: {}", field.name.name, format_type(module, field.ty)))
                .collect();
            format!("{{ {} }}", fields.join(", "))
        }
        VariantKind::TupleLike { types } => format!("({})", format_types(module, types)),
        VariantKind::UnitLike => "()".to_string(),
    }
}

pub fn format_type(module: &Module, id: TypeId) -> String {
    let ty = &module[id];
    let mut out = ty.name.name.clone();
    if let Some(pointee) = ty.pointee {
        out.push_str(&format!("<{}>", format_type(module, pointee)));
    }
    if !ty.generic_args.is_empty() {
        out.push_str(&format!("[{}]", format_types(module, &ty.generic_args)));
    }
    out
}

fn format_types(module: &Module, types: &[TypeId]) -> String {
    types
        .iter()
        .map(|ty| format_type(module, *ty))
        .collect::<Vec<_>>()
        .join(", ")
}

fn format_body(module: &Module, body: &[BlockId], out: &mut String) {
    out.push_str("{\n");
    for block_id in body {
        let block = &module[*block_id];
        out.push_str(&format!("${}:\n", block.label.name));
        for inst_id in &block.instructions {
            out.push_str("  ");
            out.push_str(&format_instruction(module, &module[*inst_id]));
            out.push('\n');
        }
    }
    out.push_str("}\n");
}

fn format_variable(module: &Module, var: &Variable) -> String {
    match var {
        Variable::Typed { name, ty, .. } => format!("{}: {}", name.name, format_type(module, *ty)),
        Variable::Untyped { name } => name.name.clone(),
    }
}

fn format_variables(module: &Module, vars: &[Variable]) -> String {
    vars.iter()
        .map(|var| format_variable(module, var))
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn format_instruction(module: &Module, inst: &Instruction) -> String {
    let var = |v: &Variable| format_variable(module, v);
    let label = |l: &SpannedName| format!("${}", l.name);
    let opcode = inst.opcode().keyword();
    let body = match &inst.kind {
        InstKind::Binary { lhs, rhs, .. } => format!("{opcode} {}, {}", var(lhs), var(rhs)),
        InstKind::Not { operand } | InstKind::GetPtr { operand } => {
            format!("{opcode} {}", var(operand))
        }
        InstKind::Load { src } => format!("load {}", var(src)),
        InstKind::GetFieldPtr { base, path } => {
            let path: Vec<String> = path
                .iter()
                .map(|sel| match sel {
                    FieldSel::Name(name) => name.name.clone(),
                    FieldSel::Index(index, _) => index.to_string(),
                })
                .collect();
            format!("getfieldptr {}, {}", var(base), path.join(", "))
        }
        InstKind::Call { func, args } => {
            format!("call {}({})", func.name, format_variables(module, args))
        }
        InstKind::Capa { literal } => format!("capa {literal}"),
        InstKind::Caps { ty, args } => format!(
            "caps {}({})",
            format_type(module, *ty),
            format_variables(module, args)
        ),
        InstKind::Cape {
            enum_name,
            generic_args,
            variant,
            args,
        } => {
            let mut text = format!("cape {}", enum_name.name);
            if !generic_args.is_empty() {
                text.push_str(&format!("[{}]", format_types(module, generic_args)));
            }
            text.push_str(&format!("::{}", variant.name));
            if !args.is_empty() {
                text.push_str(&format!("({})", format_variables(module, args)));
            }
            text
        }
        InstKind::Capsh { name } | InstKind::Capeh { name } => format!("{opcode} {}", name.name),
        InstKind::Store { dest, value } => format!("store {}, {}", var(dest), var(value)),
        InstKind::Cast { operand, to } => {
            format!("cast {} -> {}", var(operand), format_type(module, *to))
        }
        InstKind::Br { label: target } => format!("br {}", label(target)),
        InstKind::Cbr {
            cond,
            then_label,
            else_label,
        } => format!(
            "cbr {}, {}, {}",
            var(cond),
            label(then_label),
            label(else_label)
        ),
        InstKind::Ret { value } => format!("ret {}", var(value)),
        InstKind::Switch {
            scrutinee,
            default,
            arms,
        } => {
            let mut arms: Vec<String> = arms
                .iter()
                .map(|arm| format!("{} -> {}", arm.value, label(&arm.label)))
                .collect();
            arms.push(format!("default -> {}", label(default)));
            format!("switch {} {{ {} }}", var(scrutinee), arms.join(", "))
        }
        InstKind::Match {
            scrutinee,
            default,
            arms,
        } => {
            let mut arms: Vec<String> = arms
                .iter()
                .map(|arm| {
                    let bindings = if arm.bindings.is_empty() {
                        String::new()
                    } else {
                        format!("({})", format_variables(module, &arm.bindings))
                    };
                    format!("{}{} -> {}", arm.variant.name, bindings, label(&arm.label))
                })
                .collect();
            arms.push(format!("default -> {}", label(default)));
            format!("match {} {{ {} }}", var(scrutinee), arms.join(", "))
        }
        InstKind::Error => return "; <error>".to_string(),
    };
    match &inst.target {
        Some(target) => format!("{} = {body}", var(target)),
        None => body,
    }
}
