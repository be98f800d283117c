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

#[derive(Debug, Clone)]
pub struct GcTuple {
    pub items: Vec<Value>,
    pub ty: Option<CellRef>,
}

impl GcTuple {
    pub fn new(items: Vec<Value>, ty: Option<CellRef>) -> Self {
        GcTuple { items, ty }
    }
}

impl Trace for GcTuple {
    fn trace(&self, visitor: &mut dyn FnMut(Value)) {
        for v in &self.items {
            visitor(*v);
        }
        if let Some(ty) = self.ty {
            visitor(Value::cell(ty));
        }
    }
}
