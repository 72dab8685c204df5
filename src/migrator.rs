#![allow(elided_lifetimes_in_paths)]

use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_suppliers_table::Migration),
            Box::new(m20240101_000002_create_products_table::Migration),
            Box::new(m20240101_000003_create_goods_receipts_table::Migration),
            Box::new(m20240101_000004_create_receipt_line_items_table::Migration),
            Box::new(m20240101_000005_create_receipt_status_history_table::Migration),
            Box::new(m20240101_000006_create_receipt_sequences_table::Migration),
        ]
    }
}

mod m20240101_000001_create_suppliers_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000001_create_suppliers_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Suppliers::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Suppliers::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Suppliers::Name).string().not_null())
                        .col(
                            ColumnDef::new(Suppliers::Active)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(ColumnDef::new(Suppliers::CreatedAt).timestamp().not_null())
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Suppliers::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Suppliers {
        Table,
        Id,
        Name,
        Active,
        CreatedAt,
    }
}

mod m20240101_000002_create_products_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000002_create_products_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Products::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Products::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Products::Sku)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Products::Name).string().not_null())
                        .col(ColumnDef::new(Products::UnitOfMeasure).string().not_null())
                        .col(
                            ColumnDef::new(Products::StockOnHand)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Products::MinimumStock).decimal().null())
                        .col(ColumnDef::new(Products::CreatedAt).timestamp().not_null())
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Products::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Products {
        Table,
        Id,
        Sku,
        Name,
        UnitOfMeasure,
        StockOnHand,
        MinimumStock,
        CreatedAt,
    }
}

mod m20240101_000003_create_goods_receipts_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000003_create_goods_receipts_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(GoodsReceipts::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(GoodsReceipts::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(GoodsReceipts::ReceiptNumber)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(GoodsReceipts::PurchaseOrderNumber)
                                .string()
                                .null(),
                        )
                        .col(ColumnDef::new(GoodsReceipts::SupplierId).uuid().not_null())
                        .col(
                            ColumnDef::new(GoodsReceipts::Status)
                                .string_len(16)
                                .not_null(),
                        )
                        .col(ColumnDef::new(GoodsReceipts::Observations).text().null())
                        .col(ColumnDef::new(GoodsReceipts::VoidedReason).text().null())
                        .col(ColumnDef::new(GoodsReceipts::VoidedBy).uuid().null())
                        .col(
                            ColumnDef::new(GoodsReceipts::Version)
                                .integer()
                                .not_null()
                                .default(1),
                        )
                        .col(
                            ColumnDef::new(GoodsReceipts::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(GoodsReceipts::UpdatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            // Receipt numbers must be unique across the whole table; this
            // index is the backstop behind the atomic counter.
            manager
                .create_index(
                    Index::create()
                        .name("idx_goods_receipts_receipt_number")
                        .table(GoodsReceipts::Table)
                        .col(GoodsReceipts::ReceiptNumber)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_goods_receipts_status")
                        .table(GoodsReceipts::Table)
                        .col(GoodsReceipts::Status)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_goods_receipts_created_at")
                        .table(GoodsReceipts::Table)
                        .col(GoodsReceipts::CreatedAt)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(GoodsReceipts::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum GoodsReceipts {
        Table,
        Id,
        ReceiptNumber,
        PurchaseOrderNumber,
        SupplierId,
        Status,
        Observations,
        VoidedReason,
        VoidedBy,
        Version,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000004_create_receipt_line_items_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000004_create_receipt_line_items_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(ReceiptLineItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ReceiptLineItems::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ReceiptLineItems::ReceiptId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ReceiptLineItems::ProductId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ReceiptLineItems::ExpectedQuantity)
                                .decimal()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(ReceiptLineItems::ReceivedQuantity)
                                .decimal()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ReceiptLineItems::UnitOfMeasure)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ReceiptLineItems::Observations)
                                .text()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(ReceiptLineItems::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ReceiptLineItems::UpdatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_receipt_line_items_receipt")
                                .from(ReceiptLineItems::Table, ReceiptLineItems::ReceiptId)
                                .to(GoodsReceipts::Table, GoodsReceipts::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_receipt_line_items_receipt_id")
                        .table(ReceiptLineItems::Table)
                        .col(ReceiptLineItems::ReceiptId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ReceiptLineItems::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum ReceiptLineItems {
        Table,
        Id,
        ReceiptId,
        ProductId,
        ExpectedQuantity,
        ReceivedQuantity,
        UnitOfMeasure,
        Observations,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum GoodsReceipts {
        Table,
        Id,
    }
}

mod m20240101_000005_create_receipt_status_history_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000005_create_receipt_status_history_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(ReceiptStatusHistory::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ReceiptStatusHistory::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ReceiptStatusHistory::ReceiptId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ReceiptStatusHistory::PreviousStatus)
                                .string_len(16)
                                .null(),
                        )
                        .col(
                            ColumnDef::new(ReceiptStatusHistory::NewStatus)
                                .string_len(16)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ReceiptStatusHistory::ChangedBy)
                                .uuid()
                                .null(),
                        )
                        .col(ColumnDef::new(ReceiptStatusHistory::Notes).text().null())
                        .col(
                            ColumnDef::new(ReceiptStatusHistory::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_receipt_status_history_receipt")
                                .from(
                                    ReceiptStatusHistory::Table,
                                    ReceiptStatusHistory::ReceiptId,
                                )
                                .to(GoodsReceipts::Table, GoodsReceipts::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_receipt_status_history_receipt_id")
                        .table(ReceiptStatusHistory::Table)
                        .col(ReceiptStatusHistory::ReceiptId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ReceiptStatusHistory::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum ReceiptStatusHistory {
        Table,
        Id,
        ReceiptId,
        PreviousStatus,
        NewStatus,
        ChangedBy,
        Notes,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum GoodsReceipts {
        Table,
        Id,
    }
}

mod m20240101_000006_create_receipt_sequences_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000006_create_receipt_sequences_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(ReceiptSequences::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ReceiptSequences::Id)
                                .integer()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ReceiptSequences::NextValue)
                                .big_integer()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            // Seed the one counter row used for receipt numbering.
            let insert = Query::insert()
                .into_table(ReceiptSequences::Table)
                .columns([ReceiptSequences::Id, ReceiptSequences::NextValue])
                .values_panic([1.into(), 1i64.into()])
                .to_owned();
            manager.exec_stmt(insert).await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ReceiptSequences::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum ReceiptSequences {
        Table,
        Id,
        NextValue,
    }
}
