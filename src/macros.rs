/// Declares an entity once and generates its full mapping surface:
///
/// - a plain record struct (`Widget`) implementing [`Entity`](crate::Entity)
///   and [`FromRow`](crate::FromRow) for the untracked fetch path;
/// - a view trait (`WidgetView`) with typed accessors, the "interface" both
///   the record and the proxy satisfy;
/// - a proxy struct (`WidgetProxy`) backed by [`ProxyState`](crate::ProxyState)
///   that additionally implements [`TrackedRecord`](crate::TrackedRecord),
///   recording every property write in its changed set.
///
/// The `key` field is the entity's single identity property. An optional
/// `in "table"` clause overrides the default table naming convention.
///
/// ```
/// use pagefetch::tracked_entity;
///
/// tracked_entity! {
///     pub Widget in "Widgets" {
///         key id: i64,
///         name: String,
///         price: Option<f64>,
///     }
/// }
///
/// use pagefetch::TrackedRecord;
/// let mut proxy = WidgetProxy::default();
/// assert!(!proxy.is_dirty());
/// ```
#[macro_export]
macro_rules! tracked_entity {
    (
        $(#[$meta:meta])*
        $vis:vis $name:ident in $table:literal {
            key $key:ident: $key_ty:ty,
            $($field:ident: $ty:ty),* $(,)?
        }
    ) => {
        $crate::tracked_entity!(@build
            $(#[$meta])* $vis $name,
            ::core::option::Option::Some($table),
            $key: $key_ty,
            $($field: $ty),*
        );
    };
    (
        $(#[$meta:meta])*
        $vis:vis $name:ident {
            key $key:ident: $key_ty:ty,
            $($field:ident: $ty:ty),* $(,)?
        }
    ) => {
        $crate::tracked_entity!(@build
            $(#[$meta])* $vis $name,
            ::core::option::Option::None,
            $key: $key_ty,
            $($field: $ty),*
        );
    };
    (@build
        $(#[$meta:meta])* $vis:vis $name:ident,
        $table:expr,
        $key:ident: $key_ty:ty,
        $($field:ident: $ty:ty),*
    ) => {
        $crate::paste::paste! {
            $(#[$meta])*
            #[derive(Debug, Clone, Default, PartialEq)]
            $vis struct $name {
                pub $key: $key_ty,
                $(pub $field: $ty,)*
            }

            impl $crate::Entity for $name {
                fn schema() -> $crate::EntitySchema {
                    $crate::EntitySchema {
                        entity_name: stringify!($name),
                        table: $table,
                        properties: vec![
                            $crate::Property::key(
                                stringify!($key),
                                <$key_ty as $crate::PropertyValue>::property_type(),
                            ),
                            $($crate::Property::new(
                                stringify!($field),
                                <$ty as $crate::PropertyValue>::property_type(),
                            ),)*
                        ],
                    }
                }
            }

            impl $crate::FromRow for $name {
                fn from_row(row: &$crate::Row) -> $crate::Result<Self> {
                    Ok(Self {
                        $key: row.decode(stringify!($key))?,
                        $($field: row.decode(stringify!($field))?,)*
                    })
                }
            }

            /// Typed accessors shared by the plain record and its proxy.
            $vis trait [<$name View>] {
                fn $key(&self) -> $key_ty;
                fn [<set_ $key>](&mut self, value: $key_ty);
                $(
                    fn $field(&self) -> $ty;
                    fn [<set_ $field>](&mut self, value: $ty);
                )*
            }

            impl [<$name View>] for $name {
                fn $key(&self) -> $key_ty {
                    self.$key.clone()
                }

                fn [<set_ $key>](&mut self, value: $key_ty) {
                    self.$key = value;
                }

                $(
                    fn $field(&self) -> $ty {
                        self.$field.clone()
                    }

                    fn [<set_ $field>](&mut self, value: $ty) {
                        self.$field = value;
                    }
                )*
            }

            /// Change-tracked stand-in for the entity.
            #[derive(Debug, Clone, Default)]
            $vis struct [<$name Proxy>] {
                state: $crate::ProxyState,
            }

            impl [<$name View>] for [<$name Proxy>] {
                fn $key(&self) -> $key_ty {
                    self.state.read(stringify!($key))
                }

                fn [<set_ $key>](&mut self, value: $key_ty) {
                    self.state.write(stringify!($key), value);
                }

                $(
                    fn $field(&self) -> $ty {
                        self.state.read(stringify!($field))
                    }

                    fn [<set_ $field>](&mut self, value: $ty) {
                        self.state.write(stringify!($field), value);
                    }
                )*
            }

            impl $crate::TrackedRecord for [<$name Proxy>] {
                fn get(&self, property: &str) -> ::core::option::Option<&$crate::Value> {
                    $crate::TrackedRecord::get(&self.state, property)
                }

                fn set(&mut self, property: &str, value: $crate::Value) {
                    $crate::TrackedRecord::set(&mut self.state, property, value);
                }

                fn is_dirty(&self) -> bool {
                    $crate::TrackedRecord::is_dirty(&self.state)
                }

                fn set_dirty(&mut self, dirty: bool) {
                    $crate::TrackedRecord::set_dirty(&mut self.state, dirty);
                }

                fn changed_properties(&self) -> &::std::collections::BTreeSet<::std::string::String> {
                    $crate::TrackedRecord::changed_properties(&self.state)
                }
            }

            impl $crate::Entity for [<$name Proxy>] {
                fn schema() -> $crate::EntitySchema {
                    <$name as $crate::Entity>::schema()
                }
            }

            impl $crate::ProxyEntity for [<$name Proxy>] {
                fn new_proxy() -> Self {
                    Self::default()
                }
            }
        }
    };
}
