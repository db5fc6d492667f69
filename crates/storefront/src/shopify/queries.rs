//! GraphQL operations sent to the Storefront API.
//!
//! Each operation is a unit struct implementing [`GraphQLQuery`] with a
//! sibling module holding its `Variables` and `ResponseData`, the same shape
//! `#[derive(GraphQLQuery)]` generates.

use graphql_client::{GraphQLQuery, QueryBody};

use skybox_core::Money;

/// First page of products with their variants and options.
pub struct GetProducts;

/// Create a cart from a list of lines and return its checkout URL.
pub struct CreateCart;

pub mod get_products {
    use serde::{Deserialize, Serialize};

    use super::Money;

    pub const OPERATION_NAME: &str = "GetProducts";
    pub const QUERY: &str = r"
query GetProducts($first: Int!) {
  products(first: $first) {
    edges {
      node {
        id
        title
        description
        handle
        priceRange {
          minVariantPrice { amount currencyCode }
        }
        images(first: 5) {
          edges { node { url altText } }
        }
        variants(first: 10) {
          edges {
            node {
              id
              title
              price { amount currencyCode }
              availableForSale
              selectedOptions { name value }
            }
          }
        }
        options { name values }
      }
    }
  }
}
";

    #[derive(Debug, Clone, Serialize)]
    pub struct Variables {
        pub first: i64,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct ResponseData {
        pub products: Connection<ProductNode>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct Connection<T> {
        pub edges: Vec<Edge<T>>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct Edge<T> {
        pub node: T,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ProductNode {
        pub id: String,
        pub title: String,
        #[serde(default)]
        pub description: String,
        pub handle: String,
        pub price_range: PriceRange,
        pub images: Connection<ImageNode>,
        pub variants: Connection<VariantNode>,
        #[serde(default)]
        pub options: Vec<OptionNode>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct PriceRange {
        pub min_variant_price: Money,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ImageNode {
        pub url: String,
        pub alt_text: Option<String>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct VariantNode {
        pub id: String,
        pub title: String,
        pub price: Money,
        pub available_for_sale: bool,
        #[serde(default)]
        pub selected_options: Vec<SelectedOptionNode>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct SelectedOptionNode {
        pub name: String,
        pub value: String,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct OptionNode {
        pub name: String,
        pub values: Vec<String>,
    }
}

pub mod create_cart {
    use serde::{Deserialize, Serialize};

    pub const OPERATION_NAME: &str = "CreateCart";
    pub const QUERY: &str = r"
mutation CreateCart($input: CartInput!) {
  cartCreate(input: $input) {
    cart {
      id
      checkoutUrl
      totalQuantity
    }
    userErrors { field message }
  }
}
";

    #[derive(Debug, Clone, Serialize)]
    pub struct Variables {
        pub input: CartInput,
    }

    #[derive(Debug, Clone, Serialize)]
    pub struct CartInput {
        pub lines: Vec<CartLineInput>,
    }

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CartLineInput {
        pub merchandise_id: String,
        pub quantity: i64,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub cart_create: Option<CartCreatePayload>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CartCreatePayload {
        pub cart: Option<CartNode>,
        #[serde(default)]
        pub user_errors: Vec<UserErrorNode>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CartNode {
        pub id: String,
        pub checkout_url: Option<String>,
        #[serde(default)]
        pub total_quantity: i64,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct UserErrorNode {
        pub field: Option<Vec<String>>,
        pub message: String,
    }
}

impl GraphQLQuery for GetProducts {
    type Variables = get_products::Variables;
    type ResponseData = get_products::ResponseData;

    fn build_query(variables: Self::Variables) -> QueryBody<Self::Variables> {
        QueryBody {
            variables,
            query: get_products::QUERY,
            operation_name: get_products::OPERATION_NAME,
        }
    }
}

impl GraphQLQuery for CreateCart {
    type Variables = create_cart::Variables;
    type ResponseData = create_cart::ResponseData;

    fn build_query(variables: Self::Variables) -> QueryBody<Self::Variables> {
        QueryBody {
            variables,
            query: create_cart::QUERY,
            operation_name: create_cart::OPERATION_NAME,
        }
    }
}
