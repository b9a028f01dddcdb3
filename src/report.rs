// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Terminal output for spacey-boot

use owo_colors::OwoColorize;
use spacey_loaders::{LoadKind, LoadLogEntry, NativeModule, ObjectRef, Value};

/// Print `process.moduleLoadList`, one entry per line
pub fn print_load_list(entries: &[LoadLogEntry]) {
    println!("{}", "moduleLoadList:".white().bold());
    for (i, entry) in entries.iter().enumerate() {
        let kind = match entry.kind {
            LoadKind::Binding => "Internal Binding".magenta().to_string(),
            LoadKind::Module => "NativeModule".cyan().to_string(),
        };
        println!("  {:>3}  {} {}", (i + 1).dimmed(), kind, entry.id.green());
    }
}

/// Print the load list as JSON
pub fn print_load_list_json(entries: &[LoadLogEntry]) -> serde_json::Result<()> {
    println!("{}", serde_json::to_string_pretty(entries)?);
    Ok(())
}

/// Print a required module and its exports
pub fn print_module(module: &NativeModule, exports: &ObjectRef) {
    println!(
        "{} {} {}",
        "module".white().bold(),
        module.url().green(),
        format!("({})", module.filename()).dimmed()
    );
    for key in exports.own_enumerable_keys() {
        println!("    {}: {}", key.cyan(), format_value(&exports.get_own(&key)));
    }
    if let Some(facade) = module.facade() {
        println!("    {} {}", "esm:".dimmed(), facade.names().join(", "));
    }
}

/// Print a resolved binding object
pub fn print_binding(tier: &str, name: &str, binding: &ObjectRef) {
    println!("{} {}", tier.white().bold(), name.green());
    for key in binding.own_enumerable_keys() {
        println!("    {}: {}", key.cyan(), format_value(&binding.get_own(&key)));
    }
}

/// Format a value for display
fn format_value(value: &Value) -> String {
    match value {
        Value::Undefined => "undefined".dimmed().to_string(),
        Value::Null => "null".bold().to_string(),
        Value::Boolean(b) => b.to_string().yellow().to_string(),
        Value::Number(_) => value.to_js_string().yellow().to_string(),
        Value::String(s) => format!("{:?}", s).green().to_string(),
        Value::Object(obj) => format!("{{ {} }}", obj.own_enumerable_keys().join(", "))
            .cyan()
            .to_string(),
        Value::Function(func) => format!("[Function: {}]", func.name()).magenta().to_string(),
    }
}
