/// Declares a fieldless enum whose variants travel as fixed strings, both on
/// the wire (serde) and in Postgres `VARCHAR`/`TEXT` columns (diesel).
///
/// ```ignore
/// text_enum! {
///     pub enum Gender {
///         Male => "MALE",
///         Female => "FEMALE",
///     }
/// }
/// ```
///
/// The generated type gets `VARIANTS`, `as_str`, `Display`, `FromStr`, and
/// diesel `ToSql`/`FromSql` for `Text` on `Pg`. The calling crate must depend
/// on `serde` and `diesel`.
#[macro_export]
macro_rules! text_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $text:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash,
            ::serde::Serialize, ::serde::Deserialize,
            ::diesel::AsExpression, ::diesel::FromSqlRow,
        )]
        #[diesel(sql_type = ::diesel::sql_types::Text)]
        $vis enum $name {
            $( $(#[$vmeta])* #[serde(rename = $text)] $variant ),+
        }

        impl $name {
            pub const VARIANTS: &'static [&'static str] = &[$($text),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $( Self::$variant => $text ),+
                }
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $( $text => Ok(Self::$variant), )+
                    _ => Err(format!("unknown {}: {s}", stringify!($name))),
                }
            }
        }

        impl ::diesel::serialize::ToSql<::diesel::sql_types::Text, ::diesel::pg::Pg> for $name {
            fn to_sql<'b>(
                &'b self,
                out: &mut ::diesel::serialize::Output<'b, '_, ::diesel::pg::Pg>,
            ) -> ::diesel::serialize::Result {
                <str as ::diesel::serialize::ToSql<::diesel::sql_types::Text, ::diesel::pg::Pg>>::to_sql(
                    self.as_str(),
                    out,
                )
            }
        }

        impl ::diesel::deserialize::FromSql<::diesel::sql_types::Text, ::diesel::pg::Pg> for $name {
            fn from_sql(bytes: ::diesel::pg::PgValue<'_>) -> ::diesel::deserialize::Result<Self> {
                let raw = <String as ::diesel::deserialize::FromSql<
                    ::diesel::sql_types::Text,
                    ::diesel::pg::Pg,
                >>::from_sql(bytes)?;
                raw.parse::<$name>().map_err(Into::into)
            }
        }
    };
}

#[cfg(test)]
mod tests {
    crate::text_enum! {
        enum Shade {
            Light => "LIGHT",
            Dark => "DARK",
        }
    }

    #[test]
    fn strings_round_through_every_surface() {
        assert_eq!(Shade::VARIANTS, &["LIGHT", "DARK"]);
        assert_eq!("DARK".parse::<Shade>(), Ok(Shade::Dark));
        assert!("dark".parse::<Shade>().is_err());
        assert_eq!(Shade::Light.to_string(), "LIGHT");
        assert_eq!(serde_json::to_value(Shade::Dark).unwrap(), serde_json::json!("DARK"));
        let parsed: Shade = serde_json::from_value(serde_json::json!("LIGHT")).unwrap();
        assert_eq!(parsed, Shade::Light);
    }
}
