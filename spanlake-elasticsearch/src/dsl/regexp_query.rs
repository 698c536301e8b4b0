// Copyright (C) 2024 Spanlake, Inc.
//
// Spanlake is offered under the AGPL v3.0 and as commercial software.
// For commercial licensing, contact us at hello@spanlake.io.
//
// AGPL:
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as
// published by the Free Software Foundation, either version 3 of the
// License, or (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <http://www.gnu.org/licenses/>.

use serde::Serialize;

use crate::dsl::one_field_map::OneFieldMap;

pub type RegexpQuery = OneFieldMap<RegexpQueryParams>;

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct RegexpQueryParams {
    pub value: String,
}

impl RegexpQuery {
    pub fn from_field_value(field: impl ToString, value: impl ToString) -> RegexpQuery {
        OneFieldMap {
            field: field.to_string(),
            value: RegexpQueryParams {
                value: value.to_string(),
            },
        }
    }
}
