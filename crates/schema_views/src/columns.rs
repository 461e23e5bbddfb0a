//! Column layout of `information_schema.views`.
use viewcatalog::{RelationRecord, extract_db_name};

use crate::errors::{Result, SchemaViewsError};
use crate::schema::{ColumnDesc, ColumnSchema, DataType, Field};

pub const VIEWS_COLUMNS: [ColumnDesc; 10] = [
    ColumnDesc {
        name: "TABLE_CATALOG",
        datatype: DataType::Utf8,
        nullable: true,
    },
    ColumnDesc {
        name: "TABLE_SCHEMA",
        datatype: DataType::Utf8,
        nullable: false,
    },
    ColumnDesc {
        name: "TABLE_NAME",
        datatype: DataType::Utf8,
        nullable: false,
    },
    ColumnDesc {
        name: "VIEW_DEFINITION",
        datatype: DataType::Utf8,
        nullable: false,
    },
    ColumnDesc {
        name: "CHECK_OPTION",
        datatype: DataType::Utf8,
        nullable: false,
    },
    ColumnDesc {
        name: "IS_UPDATABLE",
        datatype: DataType::Utf8,
        nullable: false,
    },
    ColumnDesc {
        name: "DEFINER",
        datatype: DataType::Utf8,
        nullable: false,
    },
    ColumnDesc {
        name: "SECURITY_TYPE",
        datatype: DataType::Utf8,
        nullable: false,
    },
    ColumnDesc {
        name: "CHARACTER_SET_CLIENT",
        datatype: DataType::Utf8,
        nullable: false,
    },
    ColumnDesc {
        name: "COLLATION_CONNECTION",
        datatype: DataType::Utf8,
        nullable: false,
    },
];

/// Output schema for the views table.
pub fn views_schema() -> ColumnSchema {
    ColumnSchema::new(VIEWS_COLUMNS.iter().map(Field::from))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewsColumn {
    TableCatalog,
    TableSchema,
    TableName,
    ViewDefinition,
    CheckOption,
    IsUpdatable,
    Definer,
    SecurityType,
    CharacterSetClient,
    CollationConnection,
}

impl ViewsColumn {
    /// All columns in table order.
    pub const ALL: [ViewsColumn; 10] = [
        Self::TableCatalog,
        Self::TableSchema,
        Self::TableName,
        Self::ViewDefinition,
        Self::CheckOption,
        Self::IsUpdatable,
        Self::Definer,
        Self::SecurityType,
        Self::CharacterSetClient,
        Self::CollationConnection,
    ];

    pub fn try_from_index(index: usize) -> Result<Self> {
        Self::ALL
            .get(index)
            .copied()
            .ok_or(SchemaViewsError::UnknownColumn {
                index,
                num_columns: Self::ALL.len(),
            })
    }

    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn desc(&self) -> &'static ColumnDesc {
        &VIEWS_COLUMNS[self.index()]
    }

    /// Value of this column for a view in the given database.
    pub fn value<'a>(&self, db_name: &'a str, view: &'a RelationRecord) -> &'a str {
        match self {
            Self::TableCatalog => "def",
            Self::TableSchema => extract_db_name(db_name),
            Self::TableName => &view.name,
            Self::ViewDefinition => &view.ddl_sql,
            Self::CheckOption => "NONE",
            Self::IsUpdatable => "NO",
            // Creator and security context of views aren't tracked.
            Self::Definer => "",
            Self::SecurityType => "",
            Self::CharacterSetClient => "utf8",
            Self::CollationConnection => "utf8_general_ci",
        }
    }
}
