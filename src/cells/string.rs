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

use crate::heap::Trace;
use crate::value::Value;

#[derive(Debug, Clone)]
pub struct GcString {
    pub value: String,
}

impl GcString {
    pub fn new(value: impl Into<String>) -> Self {
        GcString { value: value.into() }
    }
}

impl Trace for GcString {
    fn trace(&self, _visitor: &mut dyn FnMut(Value)) {
        // No child Values: a string owns no references into the heap.
    }
}
