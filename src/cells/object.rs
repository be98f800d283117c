// uDashBoard: featherweight dashboard application.
//
// Copyright (C) 2019  Brandon Lewis
//
// This program is free software: you can redistribute it and/or
// modify it under the terms of the GNU Lesser General Public License
// as published by the Free Software Foundation, either version 3 of
// the License, or (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU
// Lesser General Public License for more details.
//
// You should have received a copy of the GNU Lesser General Public
// License along with this program.  If not, see
// <https://www.gnu.org/licenses/>.

use crate::heap::{CellRef, Trace};
use crate::value::Value;

/// A record. Fields keep insertion order for diagnostics/`stringify`, but
/// equality is explicitly as unordered field sets; see `fields_equal` in
/// `crate::types::equality` rather than a derived `PartialEq` here.
#[derive(Debug, Clone)]
pub struct GcObject {
    pub fields: Vec<(String, Value)>,
    pub ty: Option<CellRef>,
}

impl GcObject {
    pub fn new(fields: Vec<(String, Value)>, ty: Option<CellRef>) -> Self {
        GcObject { fields, ty }
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| *v)
    }

    pub fn set(&mut self, name: &str, value: Value) {
        if let Some(entry) = self.fields.iter_mut().find(|(n, _)| n == name) {
            entry.1 = value;
        } else {
            self.fields.push((name.to_string(), value));
        }
    }
}

impl Trace for GcObject {
    fn trace(&self, visitor: &mut dyn FnMut(Value)) {
        for (_, v) in &self.fields {
            visitor(*v);
        }
        if let Some(ty) = self.ty {
            visitor(Value::cell(ty));
        }
    }
}
